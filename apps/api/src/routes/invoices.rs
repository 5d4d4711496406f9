//! # Invoice Routes
//!
//! ```text
//! POST  /invoices              create (201)
//! GET   /invoices              all, newest first
//! GET   /invoices/recent       ?limit=5
//! GET   /invoices/:id          header + items
//! PATCH /invoices/:id/status   {status} (204)
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{CreateInvoiceRequest, InvoiceResponse, LimitQuery, UpdateStatusRequest};
use crate::error::ApiError;
use crate::routes::{ApiJson, ApiQuery};
use crate::AppState;

const DEFAULT_RECENT_LIMIT: u32 = 5;

pub async fn create_invoice(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let draft = request.into_draft()?;
    let created = state.workflow.create_invoice(draft).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let invoices = state.workflow.list_invoices().await?;
    Ok(Json(invoices.iter().map(InvoiceResponse::summary).collect()))
}

pub async fn recent_invoices(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let invoices = state.workflow.recent_invoices(limit).await?;
    Ok(Json(invoices.iter().map(InvoiceResponse::summary).collect()))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let (invoice, items) = state.workflow.get_invoice(&id).await?;
    Ok(Json(InvoiceResponse::detail(&invoice, &items)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<StatusCode, ApiError> {
    state.workflow.update_status(&id, request.status).await?;
    Ok(StatusCode::NO_CONTENT)
}
