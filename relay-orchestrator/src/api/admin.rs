//! Administrative API Handlers
//!
//! Thin facades over the state and credential stores.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use chrono::{Duration, Utc};
use relay_core::domain::affinity::WorkspaceAffinity;
use relay_core::dto::system::CleanupResult;
use relay_core::dto::user::{CredentialSummary, SetCredentials, UserStats};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::SecretSource;

/// GET /affinities
pub async fn list_affinities(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<WorkspaceAffinity>>> {
    Ok(Json(state.store.list_affinities().await?))
}

/// GET /users/{id}/stats
pub async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserStats>> {
    Ok(Json(state.store.get_user_stats(&user_id).await?))
}

/// PUT /users/{id}/credentials
///
/// Stores the email and a reference to the secret; the secret itself is
/// resolved only when a login needs it.
pub async fn set_credentials(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<SetCredentials>, JsonRejection>,
) -> ApiResult<Json<CredentialSummary>> {
    let Json(req) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email must not be empty".to_string()));
    }
    SecretSource::parse(&req.secret_ref).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let record = state
        .credentials
        .set(&user_id, req.email.trim(), &req.secret_ref)
        .await?;
    tracing::info!("Updated credentials for user {}", user_id);

    Ok(Json(CredentialSummary {
        user_id: record.user_id,
        email: record.email,
        credit_status: record.credit_status,
        is_first_login: record.is_first_login,
    }))
}

/// Largest retention window accepted by the cleanup endpoint
pub const MAX_CLEANUP_DAYS: u32 = 36_500;

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub days: Option<u32>,
}

/// POST /history/cleanup?days=N
pub async fn cleanup_history(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> ApiResult<Json<CleanupResult>> {
    let days = query.days.unwrap_or(state.config.history_retention_days);
    if days > MAX_CLEANUP_DAYS {
        return Err(ApiError::BadRequest(format!(
            "days must be at most {}",
            MAX_CLEANUP_DAYS
        )));
    }
    let older_than = Duration::try_days(i64::from(days))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| ApiError::BadRequest(format!("days out of range: {}", days)))?;

    let deleted = state.store.cleanup_history(older_than).await?;
    tracing::info!("Deleted {} history row(s) older than {} day(s)", deleted, days);

    Ok(Json(CleanupResult { deleted, days }))
}
