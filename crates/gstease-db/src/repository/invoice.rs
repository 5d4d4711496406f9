//! # Invoice Repository
//!
//! Persists invoices and their line items, draws invoice numbers, and
//! serves the read side.
//!
//! ## Create Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. UPDATE invoice_counters SET value = MAX(value, highest) + 1      │
//! │       RETURNING value                  ← first statement is a write,   │
//! │                                          takes SQLite's write lock     │
//! │    2. INSERT INTO invoices (..., 'INV-000042', ...)                     │
//! │    3. INSERT INTO invoice_items × N                                     │
//! │    4. (strict stock) deduct_in(...) × N ← any shortfall aborts all     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction → ROLLBACK.             │
//! │  No invoice without items, no items without an invoice.                │
//! │                                                                         │
//! │  UNIQUE(invoice_number) violation → ROLLBACK, draw past it (bounded).  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use gstease_core::{
    invoice_number, CoreError, GstRate, GstType, Invoice, InvoiceItem, InvoiceStatus, InvoiceType,
    Money, StockChange, TaxBreakdown, ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::stock::{deduct_in, reference};

/// Name of the counter row invoice numbers are drawn from.
const INVOICE_COUNTER: &str = "invoice";

/// A line ready to persist: snapshot fields plus computed amounts.
#[derive(Debug, Clone)]
pub struct NewInvoiceItem {
    pub product_id: Option<String>,
    pub product_name: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price: Money,
    pub gst_rate: GstRate,
    pub gst_amount: Money,
    pub total: Money,
}

/// An invoice ready to persist. Totals come from the tax calculator.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: Option<String>,
    pub invoice_type: InvoiceType,
    pub gst_type: GstType,
    pub notes: Option<String>,
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub round_off: Money,
    pub total: Money,
    pub items: Vec<NewInvoiceItem>,
}

impl NewInvoice {
    /// Assembles a persistable invoice from snapshot lines and a breakdown.
    ///
    /// `lines` and `breakdown.lines` must be in the same order.
    pub fn from_breakdown(
        customer_id: Option<String>,
        invoice_type: InvoiceType,
        gst_type: GstType,
        notes: Option<String>,
        lines: Vec<LineSnapshot>,
        breakdown: &TaxBreakdown,
    ) -> Result<Self, ValidationError> {
        if lines.len() != breakdown.lines.len() {
            return Err(ValidationError::invalid_format(
                "items",
                "line count does not match computed amounts",
            ));
        }

        let items = lines
            .into_iter()
            .zip(&breakdown.lines)
            .map(|(line, amounts)| NewInvoiceItem {
                product_id: line.product_id,
                product_name: line.product_name,
                hsn_code: line.hsn_code,
                quantity: line.quantity,
                price: line.price,
                gst_rate: line.gst_rate,
                gst_amount: amounts.gst_amount,
                total: amounts.total_amount,
            })
            .collect();

        Ok(NewInvoice {
            customer_id,
            invoice_type,
            gst_type,
            notes,
            subtotal: breakdown.subtotal,
            cgst: breakdown.cgst_amount,
            sgst: breakdown.sgst_amount,
            igst: breakdown.igst_amount,
            round_off: breakdown.round_off,
            total: breakdown.total_amount,
            items,
        })
    }
}

/// Resolved line before amounts are attached.
#[derive(Debug, Clone)]
pub struct LineSnapshot {
    pub product_id: Option<String>,
    pub product_name: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price: Money,
    pub gst_rate: GstRate,
}

/// Whether stock is deducted inside the invoice transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockSettlement {
    /// Invoice commits without touching stock; caller settles afterwards.
    Deferred,
    /// Stock is deducted in the same transaction; a shortfall aborts the invoice.
    Atomic,
}

/// Result of a committed create.
#[derive(Debug, Clone)]
pub struct PersistedInvoice {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,

    /// Stock movements committed with the invoice (`Atomic` only).
    pub stock_changes: Vec<StockChange>,
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Persists an invoice and all its items in one transaction.
    ///
    /// ## Arguments
    /// * `new` - Invoice with computed totals and snapshot lines
    /// * `settlement` - Whether stock deductions join the transaction
    /// * `max_attempts` - Draws of a fresh number on a UNIQUE collision
    ///
    /// ## Errors
    /// - `DbError::Domain(CoreError::InvoiceNumberConflict)` after `max_attempts` collisions
    /// - `DbError::Domain(CoreError::InsufficientStock)` (`Atomic` only), nothing persisted
    /// - any storage error, nothing persisted
    pub async fn create(
        &self,
        new: &NewInvoice,
        settlement: StockSettlement,
        max_attempts: u32,
    ) -> DbResult<PersistedInvoice> {
        if new.items.is_empty() {
            return Err(ValidationError::required("items").into());
        }

        let attempts = max_attempts.max(1);
        // Highest sequence value known to collide; the next draw goes past it
        let mut taken: i64 = 0;
        for attempt in 1..=attempts {
            let mut tx = self.pool.begin().await?;
            let sequence = draw_number(&mut tx, taken).await?;

            match insert_in(&mut tx, new, sequence, settlement).await {
                Ok(created) => {
                    tx.commit().await?;
                    info!(
                        invoice_number = %created.invoice.invoice_number,
                        total = %created.invoice.total(),
                        items = created.items.len(),
                        "Invoice persisted"
                    );
                    return Ok(created);
                }
                Err(e) if e.is_unique_violation_on("invoice_number") => {
                    warn!(
                        attempt,
                        invoice_number = %invoice_number::format(sequence as u64),
                        "Invoice number collision, retrying"
                    );
                    tx.rollback().await?;
                    taken = taken.max(sequence);
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::InvoiceNumberConflict { attempts }.into())
    }

    /// Gets an invoice header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, invoice_type, gst_type, status,
                   subtotal_paise, cgst_paise, sgst_paise, igst_paise, round_off_paise,
                   total_paise, notes, created_at, updated_at
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Line items of an invoice in submission order.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, line_no, product_id, product_name, hsn_code,
                   quantity, price_paise, gst_rate_bps, gst_amount_paise, total_paise,
                   created_at
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// All invoices, newest first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        self.recent(u32::MAX).await
    }

    /// The `limit` most recent invoices.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, invoice_type, gst_type, status,
                   subtotal_paise, cgst_paise, sgst_paise, igst_paise, round_off_paise,
                   total_paise, notes, created_at, updated_at
            FROM invoices
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Changes an invoice's status. No other field is touched.
    pub async fn update_status(&self, id: &str, status: InvoiceStatus) -> DbResult<()> {
        debug!(id = %id, status = status.as_str(), "Updating invoice status");

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    /// Number of invoices.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Draws the next invoice sequence value.
///
/// The counter is bumped past the highest number already stored and past
/// `taken`, so rows imported or inserted outside this path never cause a
/// repeat, and a retry after a collision never redraws the same value.
async fn draw_number(conn: &mut SqliteConnection, taken: i64) -> DbResult<i64> {
    sqlx::query_scalar(
        r#"
        UPDATE invoice_counters
        SET value = MAX(
            value,
            ?2,
            COALESCE(
                (SELECT MAX(CAST(SUBSTR(invoice_number, 5) AS INTEGER))
                 FROM invoices
                 WHERE invoice_number LIKE 'INV-%'),
                0
            )
        ) + 1
        WHERE name = ?1
        RETURNING value
        "#,
    )
    .bind(INVOICE_COUNTER)
    .bind(taken)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::Internal("invoice counter row is missing".to_string()))
}

async fn insert_in(
    conn: &mut SqliteConnection,
    new: &NewInvoice,
    sequence: i64,
    settlement: StockSettlement,
) -> DbResult<PersistedInvoice> {
    let now = Utc::now();

    let invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        invoice_number: invoice_number::format(sequence as u64),
        customer_id: new.customer_id.clone(),
        invoice_type: new.invoice_type,
        gst_type: new.gst_type,
        status: InvoiceStatus::Pending,
        subtotal_paise: new.subtotal.paise(),
        cgst_paise: new.cgst.paise(),
        sgst_paise: new.sgst.paise(),
        igst_paise: new.igst.paise(),
        round_off_paise: new.round_off.paise(),
        total_paise: new.total.paise(),
        notes: new.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    debug!(invoice_number = %invoice.invoice_number, "Drew invoice number");

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, customer_id, invoice_type, gst_type, status,
            subtotal_paise, cgst_paise, sgst_paise, igst_paise, round_off_paise,
            total_paise, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.customer_id)
    .bind(invoice.invoice_type)
    .bind(invoice.gst_type)
    .bind(invoice.status)
    .bind(invoice.subtotal_paise)
    .bind(invoice.cgst_paise)
    .bind(invoice.sgst_paise)
    .bind(invoice.igst_paise)
    .bind(invoice.round_off_paise)
    .bind(invoice.total_paise)
    .bind(&invoice.notes)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(new.items.len());
    for (idx, line) in new.items.iter().enumerate() {
        let item = InvoiceItem {
            id: Uuid::new_v4().to_string(),
            invoice_id: invoice.id.clone(),
            line_no: idx as i64 + 1,
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            hsn_code: line.hsn_code.clone(),
            quantity: line.quantity,
            price_paise: line.price.paise(),
            gst_rate_bps: line.gst_rate.bps(),
            gst_amount_paise: line.gst_amount.paise(),
            total_paise: line.total.paise(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, line_no, product_id, product_name, hsn_code,
                quantity, price_paise, gst_rate_bps, gst_amount_paise, total_paise,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.invoice_id)
        .bind(item.line_no)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(&item.hsn_code)
        .bind(item.quantity)
        .bind(item.price_paise)
        .bind(item.gst_rate_bps)
        .bind(item.gst_amount_paise)
        .bind(item.total_paise)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        items.push(item);
    }

    let mut stock_changes = Vec::new();
    if settlement == StockSettlement::Atomic {
        for item in &items {
            if let Some(product_id) = &item.product_id {
                let change = deduct_in(
                    conn,
                    product_id,
                    item.quantity,
                    reference::INVOICE,
                    Some(&invoice.id),
                )
                .await?;
                stock_changes.push(change);
            }
        }
    }

    Ok(PersistedInvoice {
        invoice,
        items,
        stock_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};
    use gstease_core::tax::{calculate, LineInput};

    fn widget_line(product_id: Option<String>, qty: i64) -> LineSnapshot {
        LineSnapshot {
            product_id,
            product_name: "Widget".to_string(),
            hsn_code: Some("8479".to_string()),
            quantity: qty,
            price: Money::from_rupees(100),
            gst_rate: GstRate::from_bps(1800),
        }
    }

    fn build(lines: Vec<LineSnapshot>, gst_type: GstType) -> NewInvoice {
        let inputs: Vec<LineInput> = lines
            .iter()
            .map(|l| LineInput::new(l.price, l.quantity, l.gst_rate))
            .collect();
        let breakdown = calculate(&inputs, gst_type).unwrap();
        NewInvoice::from_breakdown(None, InvoiceType::B2c, gst_type, None, lines, &breakdown).unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        let first = repo
            .create(&build(vec![widget_line(None, 1)], GstType::Igst), StockSettlement::Deferred, 3)
            .await
            .unwrap();
        let second = repo
            .create(&build(vec![widget_line(None, 1)], GstType::Igst), StockSettlement::Deferred, 3)
            .await
            .unwrap();

        assert_eq!(first.invoice.invoice_number, "INV-000001");
        assert_eq!(second.invoice.invoice_number, "INV-000002");
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        let created = repo
            .create(
                &build(vec![widget_line(None, 2), widget_line(None, 1)], GstType::CgstSgst),
                StockSettlement::Deferred,
                3,
            )
            .await
            .unwrap();

        let invoice = repo.get_by_id(&created.invoice.id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.subtotal_paise, 30_000);
        assert_eq!(invoice.cgst_paise, 2_700);
        assert_eq!(invoice.sgst_paise, 2_700);
        assert_eq!(invoice.total_paise, 35_400);

        let items = repo.get_items(&invoice.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_no, 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].gst_amount_paise, 3_600);
        assert_eq!(items[1].line_no, 2);
    }

    #[tokio::test]
    async fn test_round_off_is_stored_with_the_invoice() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        // ₹1 at 5%: 5 paise GST splits into 3 + 3
        let line = LineSnapshot {
            price: Money::from_rupees(1),
            gst_rate: GstRate::from_bps(500),
            ..widget_line(None, 1)
        };
        let created = repo
            .create(&build(vec![line], GstType::CgstSgst), StockSettlement::Deferred, 3)
            .await
            .unwrap();

        let invoice = repo.get_by_id(&created.invoice.id).await.unwrap().unwrap();
        assert_eq!(invoice.cgst_paise, 3);
        assert_eq!(invoice.sgst_paise, 3);
        assert_eq!(invoice.round_off_paise, 1);
        assert_eq!(invoice.total_gst().paise(), 5);
        assert_eq!(invoice.total_paise, 106);

        let items = repo.get_items(&invoice.id).await.unwrap();
        let line_totals: i64 = items.iter().map(|i| i.total_paise).sum();
        assert_eq!(line_totals + invoice.round_off_paise, invoice.total_paise);
    }

    #[tokio::test]
    async fn test_number_skips_past_existing_rows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO invoices (id, invoice_number, gst_type, subtotal_paise, total_paise, created_at, updated_at)
            VALUES ('imported', 'INV-000041', 'igst', 0, 0, ?1, ?1)
            "#,
        )
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();

        let created = db
            .invoices()
            .create(&build(vec![widget_line(None, 1)], GstType::Igst), StockSettlement::Deferred, 3)
            .await
            .unwrap();

        assert_eq!(created.invoice.invoice_number, "INV-000042");
    }

    #[tokio::test]
    async fn test_atomic_settlement_rolls_back_on_shortfall() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(
                &NewProduct::new("Widget", Money::from_rupees(100), GstRate::from_bps(1800))
                    .opening_stock(3),
            )
            .await
            .unwrap();

        let err = db
            .invoices()
            .create(
                &build(vec![widget_line(Some(product.id.clone()), 10)], GstType::CgstSgst),
                StockSettlement::Atomic,
                3,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(db.invoices().count().await.unwrap(), 0);
        assert_eq!(db.stock().current_stock(&product.id).await.unwrap(), 3);

        // The aborted draw does not burn a number
        let ok = db
            .invoices()
            .create(
                &build(vec![widget_line(Some(product.id.clone()), 2)], GstType::CgstSgst),
                StockSettlement::Atomic,
                3,
            )
            .await
            .unwrap();
        assert_eq!(ok.invoice.invoice_number, "INV-000001");
        assert_eq!(ok.stock_changes.len(), 1);
        assert_eq!(ok.stock_changes[0].balance_after, 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        let created = repo
            .create(&build(vec![widget_line(None, 1)], GstType::Igst), StockSettlement::Deferred, 3)
            .await
            .unwrap();

        repo.update_status(&created.invoice.id, InvoiceStatus::Paid).await.unwrap();
        let invoice = repo.get_by_id(&created.invoice.id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.total_paise, created.invoice.total_paise);

        assert!(matches!(
            repo.update_status("missing", InvoiceStatus::Paid).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        for _ in 0..3 {
            repo.create(&build(vec![widget_line(None, 1)], GstType::Igst), StockSettlement::Deferred, 3)
                .await
                .unwrap();
        }

        let recent = repo.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].invoice_number, "INV-000003");
        assert_eq!(recent[1].invoice_number, "INV-000002");
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }
}
