//! # Stock Ledger
//!
//! Per-product non-negative stock counter with an append-only history.
//!
//! ## Atomic Check-and-Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, check, write back (lost update under concurrency)     │
//! │     SELECT stock_quantity → 5                                          │
//! │     UPDATE products SET stock_quantity = 3                             │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional delta update                              │
//! │     UPDATE products                                                     │
//! │        SET stock_quantity = stock_quantity + :delta                    │
//! │      WHERE id = :id AND stock_quantity + :delta >= 0                   │
//! │     RETURNING stock_quantity, low_stock_threshold, name                │
//! │                                                                         │
//! │  Invoice A: -2 ─┐                                                       │
//! │  Invoice B: -4 ─┼─► serialized by SQLite's write lock                  │
//! │                 │   stock 5 → 3 (A) → B matches no row → Insufficient  │
//! │                                                                         │
//! │  Same transaction: INSERT INTO stock_history (..., balance_after)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation      | change_type  | quantity_change | Fails when             |
//! |----------------|--------------|-----------------|------------------------|
//! | `deduct`       | `sale`       | `-qty`          | stock < qty            |
//! | `add`          | `purchase`   | `+qty`          | never (bounds only)    |
//! | `return_stock` | `return`     | `+qty`          | never (bounds only)    |
//! | `adjust`       | `adjustment` | `delta`         | stock + delta < 0      |
//!
//! A failed operation leaves both the product row and the history untouched.
//! Deductions and adjustments that end at or below the product's threshold
//! carry a [`LowStockAlert`] in the returned [`StockChange`]; the caller
//! decides how to notify.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use gstease_core::validation::{
    validate_adjustment_delta, validate_adjustment_reason, validate_quantity,
};
use gstease_core::{
    ChangeType, CoreError, LowStockAlert, ReorderSuggestion, StockChange, StockHistoryEntry,
    ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;

/// Reference types written to `stock_history.reference_type`.
pub mod reference {
    pub const INVOICE: &str = "invoice";
    pub const PURCHASE_ORDER: &str = "purchase_order";
    pub const MANUAL: &str = "manual";
    pub const RETURN: &str = "return";
}

/// A single movement to apply.
#[derive(Debug, Clone)]
struct Movement<'a> {
    product_id: &'a str,
    change_type: ChangeType,
    delta: i64,
    reference_type: &'a str,
    reference_id: Option<&'a str>,
    notes: Option<&'a str>,
}

/// The stock ledger.
///
/// Each public method runs in its own transaction. For deductions that must
/// commit or roll back with an invoice, use [`deduct_in`] on the invoice's
/// transaction instead.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Removes `qty` units for a sale.
    ///
    /// ## Errors
    /// - `DbError::Domain(CoreError::InsufficientStock)` if stock < qty
    /// - `DbError::NotFound` for an unknown product
    pub async fn deduct(
        &self,
        product_id: &str,
        qty: i64,
        reference_type: &str,
        reference_id: Option<&str>,
    ) -> DbResult<StockChange> {
        let mut tx = self.pool.begin().await?;
        let change = deduct_in(&mut tx, product_id, qty, reference_type, reference_id).await?;
        tx.commit().await?;
        Ok(change)
    }

    /// Adds `qty` units received from a supplier.
    pub async fn add(
        &self,
        product_id: &str,
        qty: i64,
        reference_type: &str,
        reference_id: Option<&str>,
    ) -> DbResult<StockChange> {
        validate_quantity(qty)?;
        self.apply(Movement {
            product_id,
            change_type: ChangeType::Purchase,
            delta: qty,
            reference_type,
            reference_id,
            notes: None,
        })
        .await
    }

    /// Puts `qty` units back on the shelf after a customer return.
    pub async fn return_stock(
        &self,
        product_id: &str,
        qty: i64,
        reference_type: &str,
        reference_id: Option<&str>,
    ) -> DbResult<StockChange> {
        validate_quantity(qty)?;
        self.apply(Movement {
            product_id,
            change_type: ChangeType::Return,
            delta: qty,
            reference_type,
            reference_id,
            notes: None,
        })
        .await
    }

    /// Applies a signed manual correction.
    ///
    /// ## Errors
    /// - `DbError::Domain(CoreError::InvalidAdjustment)` if the result would be negative
    pub async fn adjust(&self, product_id: &str, delta: i64, reason: &str) -> DbResult<StockChange> {
        validate_adjustment_delta(delta)?;
        validate_adjustment_reason(reason)?;
        self.apply(Movement {
            product_id,
            change_type: ChangeType::Adjustment,
            delta,
            reference_type: reference::MANUAL,
            reference_id: None,
            notes: Some(reason.trim()),
        })
        .await
    }

    /// History for one product, oldest first.
    pub async fn history(&self, product_id: &str, limit: u32) -> DbResult<Vec<StockHistoryEntry>> {
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Product", product_id));
        }

        let entries = sqlx::query_as::<_, StockHistoryEntry>(
            r#"
            SELECT id, product_id, change_type, quantity_change, balance_after,
                   reference_type, reference_id, notes, created_at
            FROM stock_history
            WHERE product_id = ?1
            ORDER BY created_at, rowid
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Current stock for one product.
    pub async fn current_stock(&self, product_id: &str) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))
    }

    /// Restock proposals for every low-stock product.
    pub async fn reorder_suggestions(&self) -> DbResult<Vec<ReorderSuggestion>> {
        let products = ProductRepository::new(self.pool.clone()).low_stock().await?;
        Ok(products.iter().map(ReorderSuggestion::for_product).collect())
    }

    async fn apply(&self, movement: Movement<'_>) -> DbResult<StockChange> {
        let mut tx = self.pool.begin().await?;
        let change = apply_in(&mut tx, &movement).await?;
        tx.commit().await?;
        Ok(change)
    }
}

/// Deducts stock on an existing connection or transaction.
///
/// Used by the invoice transaction when stock must settle atomically with
/// the invoice.
pub async fn deduct_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    reference_type: &str,
    reference_id: Option<&str>,
) -> DbResult<StockChange> {
    validate_quantity(qty)?;
    apply_in(
        conn,
        &Movement {
            product_id,
            change_type: ChangeType::Sale,
            delta: -qty,
            reference_type,
            reference_id,
            notes: None,
        },
    )
    .await
}

async fn apply_in(conn: &mut SqliteConnection, m: &Movement<'_>) -> DbResult<StockChange> {
    if m.reference_type.trim().is_empty() {
        return Err(ValidationError::required("referenceType").into());
    }

    let now = Utc::now();

    debug!(
        product_id = %m.product_id,
        change_type = m.change_type.as_str(),
        delta = m.delta,
        "Applying stock movement"
    );

    let updated: Option<(i64, i64, String)> = sqlx::query_as(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + ?1,
            updated_at = ?2
        WHERE id = ?3 AND stock_quantity + ?1 >= 0
        RETURNING stock_quantity, low_stock_threshold, name
        "#,
    )
    .bind(m.delta)
    .bind(now)
    .bind(m.product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((balance_after, threshold, name)) = updated else {
        return Err(rejection(conn, m).await);
    };

    let history_id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO stock_history (
            id, product_id, change_type, quantity_change, balance_after,
            reference_type, reference_id, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&history_id)
    .bind(m.product_id)
    .bind(m.change_type)
    .bind(m.delta)
    .bind(balance_after)
    .bind(m.reference_type)
    .bind(m.reference_id)
    .bind(m.notes)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let low_stock = match m.change_type {
        ChangeType::Sale | ChangeType::Adjustment => {
            LowStockAlert::check(m.product_id, &name, balance_after, threshold)
        }
        ChangeType::Purchase | ChangeType::Return => None,
    };

    if let Some(alert) = &low_stock {
        info!(
            product = %alert.product_name,
            stock = alert.current_stock,
            threshold = alert.threshold,
            "Product at or below low-stock threshold"
        );
    }

    Ok(StockChange {
        product_id: m.product_id.to_string(),
        change_type: m.change_type,
        quantity_change: m.delta,
        balance_after,
        history_id,
        low_stock,
    })
}

/// Explains why the conditional update matched no row.
async fn rejection(conn: &mut SqliteConnection, m: &Movement<'_>) -> DbError {
    let current: Result<Option<(String, i64)>, sqlx::Error> =
        sqlx::query_as("SELECT name, stock_quantity FROM products WHERE id = ?1")
            .bind(m.product_id)
            .fetch_optional(&mut *conn)
            .await;

    match current {
        Ok(Some((name, available))) => match m.change_type {
            ChangeType::Adjustment => CoreError::InvalidAdjustment {
                product: name,
                delta: m.delta,
                resulting: available + m.delta,
            }
            .into(),
            _ => CoreError::InsufficientStock {
                product: name,
                available,
                requested: -m.delta,
            }
            .into(),
        },
        Ok(None) => DbError::not_found("Product", m.product_id),
        Err(e) => e.into(),
    }
}
