//! # Repository Module
//!
//! Data access layer for GST Ease entities.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Repository Pattern                               │
//! │                                                                         │
//! │  HTTP Handler / InvoiceWorkflow                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Repositories                               │   │
//! │  │                                                                 │   │
//! │  │  ProductRepository   CustomerRepository   InvoiceRepository    │   │
//! │  │  • insert            • insert             • create (tx+number) │   │
//! │  │  • get_by_id         • get_by_id          • get_by_id / items  │   │
//! │  │  • list / low_stock  • list               • list / recent      │   │
//! │  │                                           • update_status      │   │
//! │  │  StockLedger                ReportRepository                   │   │
//! │  │  • deduct / add / return    • dashboard_stats                  │   │
//! │  │  • adjust / history                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlitePool                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write that touches more than one row runs in a single transaction
//! whose first statement is a write, so SQLite takes the write lock up front.

pub mod customer;
pub mod invoice;
pub mod product;
pub mod report;
pub mod stock;
