//! # Report Repository
//!
//! Read-only aggregates for the dashboard.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use gstease_core::DashboardStats;

use crate::error::DbResult;

/// Repository for aggregate queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Headline numbers for the dashboard.
    ///
    /// `today_start` is the first instant of "today" in the caller's
    /// business timezone; invoices created at or after it count as today's.
    pub async fn dashboard_stats(&self, today_start: DateTime<Utc>) -> DbResult<DashboardStats> {
        let (total_revenue_paise, total_invoices, pending_invoices): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COALESCE(SUM(total_paise), 0),
                       COUNT(*),
                       COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0)
                FROM invoices
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let (today_revenue_paise, today_invoices): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_paise), 0), COUNT(*)
            FROM invoices
            WHERE created_at >= ?1
            "#,
        )
        .bind(today_start)
        .fetch_one(&self.pool)
        .await?;

        let (total_products, low_stock_products): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN stock_quantity <= low_stock_threshold THEN 1 ELSE 0 END), 0)
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let total_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats {
            total_revenue_paise,
            total_invoices,
            total_products,
            total_customers,
            pending_invoices,
            low_stock_products,
            today_revenue_paise,
            today_invoices,
        })
    }
}
