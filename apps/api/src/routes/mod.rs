//! # HTTP Routes
//!
//! Handlers grouped by resource. Each handler is a thin shim: extract, call
//! the workflow or a repository, shape the response.
//!
//! ## Route Organization
//! ```text
//! routes/
//! ├── mod.rs        ◄─── You are here (router, extractors)
//! ├── invoices.rs   ◄─── Create, read, list, status
//! ├── inventory.rs  ◄─── Stock ledger operations, low stock
//! ├── dashboard.rs  ◄─── Headline numbers
//! └── health.rs     ◄─── Liveness + database ping
//! ```
//!
//! ## Extractors
//! `ApiJson` and `ApiQuery` wrap axum's `Json` and `Query` so malformed
//! input comes back in the same `{code, message}` shape as every other
//! error instead of axum's plain-text rejection.

pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod invoices;

use axum::extract::{FromRequest, FromRequestParts};
use axum::routing::{get, patch, post};
use axum::Router;

use crate::error::ApiError;
use crate::AppState;

/// JSON body extractor with [`ApiError`] rejections.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// All API routes. State is attached by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/invoices/recent", get(invoices::recent_invoices))
        .route("/invoices/:id", get(invoices::get_invoice))
        .route("/invoices/:id/status", patch(invoices::update_status))
        .route("/products/low-stock", get(inventory::low_stock_products))
        .route("/products/:id/stock-history", get(inventory::stock_history))
        .route("/products/:id/stock/add", post(inventory::add_stock))
        .route("/products/:id/stock/adjust", post(inventory::adjust_stock))
        .route(
            "/inventory/reorder-suggestions",
            get(inventory::reorder_suggestions),
        )
        .route("/dashboard/stats", get(dashboard::stats))
}
