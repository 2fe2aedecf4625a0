//! Reading ingest and query endpoints

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::debug;

use crate::{
    SensorPayload,
    api::{
        error::{ApiError, ApiResult},
        state::ApiState,
        types::{IngestResponse, LatestQuery, LatestResponse},
    },
    service::DEFAULT_LATEST_COUNT,
};

/// Upper bound on `count` for `GET /data/latest`
pub const MAX_LATEST_COUNT: usize = 1000;

/// POST /data
///
/// Classifies, persists and broadcasts one reading. Replies
/// `{success, alert}`; a body that is not a sensor payload is answered with
/// HTTP 400 and a failed store with HTTP 500 `{success: false, error:
/// "storage"}`.
pub async fn ingest(
    State(state): State<ApiState>,
    payload: Result<Json<SensorPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!("rejected payload: {}", rejection.body_text());
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    let response = state.service.ingest(payload).await;

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(response)))
}

/// GET /data/latest?count=N
///
/// The N most recent readings, newest first. `count` defaults to 5 and is
/// capped at 1000; `count=0` is rejected.
pub async fn latest(
    State(state): State<ApiState>,
    query: Result<Query<LatestQuery>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<LatestResponse>)> {
    let Query(query) = query.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let count = resolve_count(query.count)?;

    let response = state.service.latest_readings(count).await;

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(response)))
}

fn resolve_count(count: Option<usize>) -> ApiResult<usize> {
    match count {
        None => Ok(DEFAULT_LATEST_COUNT),
        Some(0) => Err(ApiError::InvalidRequest(
            "count must be at least 1".to_string(),
        )),
        Some(count) => Ok(count.min(MAX_LATEST_COUNT)),
    }
}
