//! # Domain Types
//!
//! Core domain types used throughout GST Ease.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Invoice      │   │  InvoiceItem    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  invoice_id(FK) │       │
//! │  │  name, hsn_code │   │  invoice_number │   │  product_name   │       │
//! │  │  price_paise    │   │  gst_type       │   │   (snapshot)    │       │
//! │  │  stock_quantity │   │  cgst/sgst/igst │   │  gst_amount     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    GstRate      │   │    GstType      │   │ StockHistory    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  CgstSgst       │   │  change_type    │       │
//! │  │  1800 = 18%     │   │  Igst           │   │  balance_after  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (`invoice_number`, `gst_number`)

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// GST Rate
// =============================================================================

/// GST rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. The GST slabs (0, 5, 12, 18, 28) and cess-style
/// fractional rates like 0.25% or 3% all fit without a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstRate(u32);

impl GstRate {
    /// 100% in basis points; no GST slab goes higher.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        GstRate(bps)
    }

    /// Parses a percentage as received over HTTP (`18`, `"12.5"`).
    ///
    /// ## Rules
    /// - 0 to 100 inclusive
    /// - At most two fractional digits
    ///
    /// ## Example
    /// ```rust
    /// use gstease_core::types::GstRate;
    /// use rust_decimal::Decimal;
    ///
    /// let rate = GstRate::from_percent("gstRate", Decimal::new(18, 0)).unwrap();
    /// assert_eq!(rate.bps(), 1800);
    /// ```
    pub fn from_percent(field: &str, pct: Decimal) -> Result<Self, ValidationError> {
        if pct.normalize().scale() > 2 {
            return Err(ValidationError::invalid_format(
                field,
                "must have at most 2 decimal places",
            ));
        }

        let bps = pct
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|b| b.to_i64())
            .ok_or_else(|| ValidationError::invalid_format(field, "rate is too large"))?;

        if !(0..=Self::MAX_BPS as i64).contains(&bps) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: 100,
            });
        }

        Ok(GstRate(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a two-decimal percentage (`18.00`).
    #[inline]
    pub fn to_percent(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    /// Zero-rated supply.
    #[inline]
    pub const fn zero() -> Self {
        GstRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for GstRate {
    fn default() -> Self {
        GstRate::zero()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// How GST on an invoice is split between authorities.
///
/// ```text
/// Seller state == buyer state  →  CgstSgst  (half central, half state)
/// Seller state != buyer state  →  Igst      (all integrated)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GstType {
    /// Intra-state supply: central + state GST in equal halves.
    CgstSgst,
    /// Inter-state supply: integrated GST.
    Igst,
}

impl GstType {
    /// Wire/database name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            GstType::CgstSgst => "cgst_sgst",
            GstType::Igst => "igst",
        }
    }
}

/// Business-to-business or business-to-consumer.
///
/// Used both as the invoice type and as a customer's default classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    B2b,
    B2c,
}

impl Default for InvoiceType {
    fn default() -> Self {
        InvoiceType::B2c
    }
}

impl InvoiceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::B2b => "b2b",
            InvoiceType::B2c => "b2c",
        }
    }
}

/// Payment status of an invoice. The only field that changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

/// Kind of stock movement recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Deducted by an invoice.
    Sale,
    /// Received from a supplier.
    Purchase,
    /// Manual correction (stock count, damage).
    Adjustment,
    /// Customer returned goods.
    Return,
}

impl ChangeType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Sale => "sale",
            ChangeType::Purchase => "purchase",
            ChangeType::Adjustment => "adjustment",
            ChangeType::Return => "return",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its running stock balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, copied onto invoice lines.
    pub name: String,

    /// HSN/SAC classification code.
    pub hsn_code: Option<String>,

    /// Unit of measure (`pcs`, `kg`, `box`).
    pub unit: String,

    /// Price in paise, exclusive of GST.
    pub price_paise: i64,

    /// GST rate in basis points (1800 = 18%).
    pub gst_rate_bps: u32,

    /// Units on hand. Never negative once a transaction commits.
    pub stock_quantity: i64,

    /// Alert when stock falls to or below this level.
    pub low_stock_threshold: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    /// Returns the GST rate.
    #[inline]
    pub fn gst_rate(&self) -> GstRate {
        GstRate::from_bps(self.gst_rate_bps)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A billed party. Read-only from the invoice workflow.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    /// GSTIN for registered businesses.
    pub gst_number: Option<String>,

    /// State of supply, decides CGST/SGST vs IGST in the UI.
    pub state: Option<String>,

    /// Default invoice type for this customer.
    pub customer_type: InvoiceType,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// An issued invoice.
///
/// ## Invariants
/// - `total_paise == subtotal_paise + cgst_paise + sgst_paise + igst_paise`
/// - `round_off_paise` is 0 or 1: the paisa an odd CGST/SGST split adds on
///   top of the line GST, so line totals + round-off == total
/// - `CgstSgst` ⇒ `cgst_paise == sgst_paise` and `igst_paise == 0`
/// - `Igst` ⇒ `cgst_paise == sgst_paise == 0`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,

    /// Human-facing number, `INV-000042`.
    pub invoice_number: String,

    pub customer_id: Option<String>,
    pub invoice_type: InvoiceType,
    pub gst_type: GstType,
    pub status: InvoiceStatus,

    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub igst_paise: i64,
    pub round_off_paise: i64,
    pub total_paise: i64,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_paise(self.subtotal_paise)
    }

    #[inline]
    pub fn cgst(&self) -> Money {
        Money::from_paise(self.cgst_paise)
    }

    #[inline]
    pub fn sgst(&self) -> Money {
        Money::from_paise(self.sgst_paise)
    }

    #[inline]
    pub fn igst(&self) -> Money {
        Money::from_paise(self.igst_paise)
    }

    #[inline]
    pub fn round_off(&self) -> Money {
        Money::from_paise(self.round_off_paise)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }

    /// GST summed over the lines, before the split's round-off.
    #[inline]
    pub fn total_gst(&self) -> Money {
        self.cgst() + self.sgst() + self.igst() - self.round_off()
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// One line on an invoice.
///
/// ## Snapshot Pattern
/// Name, HSN code, price and rate are copied at billing time. Later catalog
/// edits (or deleting the product) never change an issued invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,

    /// Position on the invoice, starting at 1.
    pub line_no: i64,

    /// Catalog product, `None` for free-text service lines or deleted products.
    pub product_id: Option<String>,

    pub product_name: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price_paise: i64,
    pub gst_rate_bps: u32,
    pub gst_amount_paise: i64,

    /// `price × quantity + gst_amount`.
    pub total_paise: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    #[inline]
    pub fn gst_rate(&self) -> GstRate {
        GstRate::from_bps(self.gst_rate_bps)
    }

    #[inline]
    pub fn gst_amount(&self) -> Money {
        Money::from_paise(self.gst_amount_paise)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Append-only record of a single stock movement.
///
/// `balance_after` is the product's stock immediately after this change,
/// so each row can be checked against its predecessor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockHistoryEntry {
    pub id: String,
    pub product_id: String,
    pub change_type: ChangeType,

    /// Signed: negative for sales, positive for purchases and returns.
    pub quantity_change: i64,

    pub balance_after: i64,

    /// What caused the movement (`invoice`, `purchase_order`, `manual`).
    pub reference_type: String,
    pub reference_id: Option<String>,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Raised when a stock movement leaves a product at or below its threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockAlert {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: i64,
    pub threshold: i64,
}

impl LowStockAlert {
    /// Builds an alert when `stock <= threshold`, `None` otherwise.
    pub fn check(
        product_id: &str,
        product_name: &str,
        stock: i64,
        threshold: i64,
    ) -> Option<LowStockAlert> {
        (stock <= threshold).then(|| LowStockAlert {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            current_stock: stock,
            threshold,
        })
    }
}

/// Outcome of a committed ledger operation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockChange {
    pub product_id: String,
    pub change_type: ChangeType,
    pub quantity_change: i64,
    pub balance_after: i64,

    /// Id of the history row written with the change.
    pub history_id: String,

    pub low_stock: Option<LowStockAlert>,
}

/// Restock proposal for a low-stock product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReorderSuggestion {
    pub product_id: String,
    pub product_name: String,
    pub unit: String,
    pub current_stock: i64,
    pub threshold: i64,

    /// Twice the threshold.
    pub suggested_quantity: i64,
}

impl ReorderSuggestion {
    /// Derives a suggestion from a product row.
    pub fn for_product(product: &Product) -> Self {
        ReorderSuggestion {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit: product.unit.clone(),
            current_stock: product.stock_quantity,
            threshold: product.low_stock_threshold,
            suggested_quantity: product.low_stock_threshold * 2,
        }
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_revenue_paise: i64,
    pub total_invoices: i64,
    pub total_products: i64,
    pub total_customers: i64,
    pub pending_invoices: i64,
    pub low_stock_products: i64,
    pub today_revenue_paise: i64,
    pub today_invoices: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_gst_rate_from_percent() {
        let rate = GstRate::from_percent("gstRate", Decimal::from_str("18").unwrap()).unwrap();
        assert_eq!(rate.bps(), 1800);

        let rate = GstRate::from_percent("gstRate", Decimal::from_str("0.25").unwrap()).unwrap();
        assert_eq!(rate.bps(), 25);
        assert_eq!(rate.to_percent().to_string(), "0.25");
    }

    #[test]
    fn test_gst_rate_rejects_out_of_range() {
        let err = GstRate::from_percent("gstRate", Decimal::from_str("-1").unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        let err = GstRate::from_percent("gstRate", Decimal::from_str("100.01").unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        let err = GstRate::from_percent("gstRate", Decimal::from_str("5.125").unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&GstType::CgstSgst).unwrap(), "\"cgst_sgst\"");
        assert_eq!(serde_json::to_string(&InvoiceType::B2b).unwrap(), "\"b2b\"");
        assert_eq!(
            serde_json::from_str::<InvoiceStatus>("\"overdue\"").unwrap(),
            InvoiceStatus::Overdue
        );
        assert!(serde_json::from_str::<InvoiceStatus>("\"cancelled\"").is_err());
        assert_eq!(ChangeType::Return.as_str(), "return");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(InvoiceType::default(), InvoiceType::B2c);
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Pending);
    }

    #[test]
    fn test_low_stock_alert_check() {
        assert!(LowStockAlert::check("p1", "Widget", 11, 10).is_none());

        let alert = LowStockAlert::check("p1", "Widget", 10, 10).unwrap();
        assert_eq!(alert.current_stock, 10);
        assert_eq!(alert.threshold, 10);
    }
}
