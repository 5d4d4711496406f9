//! # GST Ease API
//!
//! axum REST server in front of the billing core.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Request Path                                         │
//! │                                                                         │
//! │  HTTP ──► TraceLayer ──► routes::* ──► InvoiceWorkflow ──► gstease-db   │
//! │                              │               │                          │
//! │                              │               └──► DispatcherHandle      │
//! │                              │                    (fire and forget)     │
//! │                              ▼                                          │
//! │                     Result<Json<_>, ApiError>                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - `config`: layered settings
//! - `error`: `ApiError` and status mapping
//! - `dto`: JSON request/response bodies
//! - `workflow`: invoice creation state machine
//! - `routes`: handlers and router

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod workflow;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gstease_db::Database;
use gstease_notify::DispatcherHandle;

pub use config::AppConfig;
pub use error::{ApiError, ErrorCode};
pub use workflow::InvoiceWorkflow;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub workflow: Arc<InvoiceWorkflow>,
}

impl AppState {
    pub fn new(db: Database, notifier: DispatcherHandle, config: &AppConfig) -> Self {
        let workflow = InvoiceWorkflow::new(db.clone(), notifier, config);
        AppState {
            db,
            workflow: Arc::new(workflow),
        }
    }
}

/// Full application router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - Default: `info,gstease=debug,sqlx=warn`
/// - Override with `RUST_LOG`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gstease=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
