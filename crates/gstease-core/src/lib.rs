//! # gstease-core: Pure Billing Logic for GST Ease
//!
//! This crate holds the arithmetic and rules behind every invoice:
//! integer money, GST rates, the CGST/SGST/IGST split, invoice numbering
//! and input validation. Nothing in here touches a database or a socket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GST Ease Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Billing UI (forms)                           │   │
//! │  │    New Invoice ──► Line Items ──► Save ──► Invoice View        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    InvoiceWorkflow: validate → compute → persist → settle      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gstease-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    tax    │  │  invoice_ │  │   │
//! │  │   │  Product  │  │   Money   │  │ GST split │  │  number   │  │   │
//! │  │   │  Invoice  │  │ (paise)   │  │  totals   │  │ INV-00001 │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 gstease-db (Database Layer)                     │   │
//! │  │        SQLite queries, migrations, repositories, ledger         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Invoice, StockHistoryEntry)
//! - [`money`] - Money type in integer paise
//! - [`tax`] - GST tax calculator
//! - [`invoice_number`] - `INV-NNNNNN` sequence formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use gstease_core::money::Money;
//! use gstease_core::tax::{calculate, LineInput};
//! use gstease_core::types::{GstRate, GstType};
//!
//! let lines = [LineInput::new(Money::from_paise(10_000), 2, GstRate::from_bps(1800))];
//! let breakdown = calculate(&lines, GstType::CgstSgst).unwrap();
//!
//! assert_eq!(breakdown.subtotal.paise(), 20_000);
//! assert_eq!(breakdown.cgst_amount.paise(), 1_800);
//! assert_eq!(breakdown.sgst_amount.paise(), 1_800);
//! assert_eq!(breakdown.total_amount.paise(), 23_600);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice_number;
pub mod money;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use tax::{LineAmounts, LineInput, TaxBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single invoice.
pub const MAX_INVOICE_LINES: usize = 200;

/// Maximum quantity on a single invoice line or stock movement.
///
/// ## Business Reason
/// Catches fat-fingered entries (an extra zero or two) before they reach
/// the ledger.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Stock level at or below which a product is considered low on stock,
/// used when a product is created without an explicit threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Unit of measure used when a product has none.
pub const DEFAULT_UNIT: &str = "pcs";
