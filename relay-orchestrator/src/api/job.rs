//! Job API Handlers
//!
//! Read-only views of job history and of the jobs currently in flight.

use axum::{
    Json,
    extract::{Path, State},
};
use relay_core::domain::job::Job;
use relay_core::dto::job::SessionsOverview;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// GET /jobs/{id}
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);

    let job = state
        .store
        .get_job(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", id)))?;

    Ok(Json(job))
}

/// GET /sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsOverview> {
    let active = state.active.snapshot();

    Json(SessionsOverview {
        total: active.len(),
        active,
        max_parallel_jobs: state.config.max_parallel_jobs,
        queue_capacity: state.config.queue_capacity,
    })
}
