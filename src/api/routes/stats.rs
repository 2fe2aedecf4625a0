//! Hub statistics endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::StatsResponse};

/// GET /stats
///
/// Returns the store summary and the broadcaster counters
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<StatsResponse>> {
    let storage = state.service.store().get_stats().await?;
    let broadcaster = state.broadcaster().stats().await?;

    Ok(Json(StatsResponse {
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage,
        broadcaster,
    }))
}
