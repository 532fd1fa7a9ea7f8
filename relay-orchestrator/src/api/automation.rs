//! Automation API Handlers
//!
//! Entry point for callers: accepts a job and returns before it runs.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use relay_core::dto::job::{JobAccepted, SubmitJob};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /automation/{route}
/// POST /api/v1/automation/{route}
pub async fn submit_job(
    State(state): State<AppState>,
    Path(route): Path<String>,
    body: Result<Json<SubmitJob>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    tracing::debug!("Automation request on route {}", route);

    let accepted = state.dispatcher.submit(&route, request).await?;

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}
