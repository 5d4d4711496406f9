use axum::extract::State;
use axum::Json;

use crate::dto::DashboardStatsResponse;
use crate::error::ApiError;
use crate::AppState;

/// `GET /dashboard/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStatsResponse>, ApiError> {
    let stats = state.workflow.dashboard_stats().await?;
    Ok(Json(stats.into()))
}
