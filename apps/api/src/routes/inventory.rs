//! Stock ledger endpoints.
//!
//! Movements that leave a product at or below its threshold queue a
//! low-stock alert, same as invoice settlement does.

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use gstease_db::reference;

use crate::dto::{
    AddStockRequest, AdjustStockRequest, LimitQuery, ProductResponse, ReorderSuggestionResponse,
    StockChangeResponse, StockHistoryResponse,
};
use crate::error::ApiError;
use crate::routes::{ApiJson, ApiQuery};
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: u32 = 50;

pub async fn low_stock_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.db.products().low_stock().await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

pub async fn stock_history(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<Vec<StockHistoryResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let entries = state.db.stock().history(&product_id, limit).await?;
    Ok(Json(entries.into_iter().map(StockHistoryResponse::from).collect()))
}

pub async fn add_stock(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    ApiJson(request): ApiJson<AddStockRequest>,
) -> Result<Json<StockChangeResponse>, ApiError> {
    let reference_type = request
        .reference_type
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(reference::PURCHASE_ORDER);

    let change = state
        .db
        .stock()
        .add(
            &product_id,
            request.quantity,
            reference_type,
            request.reference_id.as_deref(),
        )
        .await?;

    info!(
        product_id = %product_id,
        quantity = request.quantity,
        balance = change.balance_after,
        "Stock added"
    );
    state.workflow.announce_low_stock(&change);
    Ok(Json(StockChangeResponse::from(&change)))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    ApiJson(request): ApiJson<AdjustStockRequest>,
) -> Result<Json<StockChangeResponse>, ApiError> {
    let change = state
        .db
        .stock()
        .adjust(&product_id, request.delta, &request.reason)
        .await?;

    info!(
        product_id = %product_id,
        delta = request.delta,
        balance = change.balance_after,
        "Stock adjusted"
    );
    state.workflow.announce_low_stock(&change);
    Ok(Json(StockChangeResponse::from(&change)))
}

pub async fn reorder_suggestions(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReorderSuggestionResponse>>, ApiError> {
    let suggestions = state.db.stock().reorder_suggestions().await?;
    Ok(Json(
        suggestions
            .into_iter()
            .map(ReorderSuggestionResponse::from)
            .collect(),
    ))
}
