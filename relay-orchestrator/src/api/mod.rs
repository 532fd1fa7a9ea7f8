//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod admin;
pub mod automation;
pub mod error;
pub mod health;
pub mod job;
pub mod video;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::repository::{CredentialStore, StateStore};
use crate::service::{ActiveJobs, Dispatcher};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<dyn StateStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub active: Arc<ActiveJobs>,
    pub config: Arc<Config>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job submission
        .route("/automation/{route}", post(automation::submit_job))
        .route("/api/v1/automation/{route}", post(automation::submit_job))
        // Job endpoints
        .route("/jobs/{id}", get(job::get_job))
        .route("/sessions", get(job::list_sessions))
        // Artifacts
        .route("/videos/{filename}", get(video::get_video))
        // Administration
        .route("/affinities", get(admin::list_affinities))
        .route("/users/{id}/stats", get(admin::user_stats))
        .route("/users/{id}/credentials", put(admin::set_credentials))
        .route("/history/cleanup", post(admin::cleanup_history))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
