//! Health Check API Handler

use axum::Json;
use chrono::Utc;
use relay_core::dto::system::HealthStatus;

/// GET /health
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        timestamp: Utc::now(),
    })
}
