//! # gstease-db: Database Layer for GST Ease
//!
//! This crate provides database access for the GST Ease billing core.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GST Ease Data Flow                               │
//! │                                                                         │
//! │  POST /invoices → InvoiceWorkflow                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    gstease-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ InvoiceRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ StockLedger    │   │ 001_initial  │  │   │
//! │  │   │ WAL, FK on    │    │ ProductRepo    │   │  _schema.sql │  │   │
//! │  │   │               │    │ Customer/Report│   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (gstease.db)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (invoice, stock, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gstease_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("gstease.db")).await?;
//!
//! let change = db.stock().add(&product_id, 20, reference::PURCHASE_ORDER, Some("PO-7")).await?;
//! let low = db.products().low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::{CustomerRepository, NewCustomer};
pub use repository::invoice::{
    InvoiceRepository, LineSnapshot, NewInvoice, NewInvoiceItem, PersistedInvoice, StockSettlement,
};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::report::ReportRepository;
pub use repository::stock::{deduct_in, reference, StockLedger};
