//! Service-level DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

/// Response of `POST /history/cleanup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResult {
    pub deleted: u64,
    pub days: u32,
}
