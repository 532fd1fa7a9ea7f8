//! Job DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::job::JobStage;

/// Automation request as posted by a caller.
///
/// Every field is optional at the wire level so that a missing field can be
/// reported by name instead of as a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJob {
    pub job_id: Option<String>,
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub timestamp: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<String>,
    /// Seconds
    pub timeout: Option<u64>,
    pub callback_url: Option<String>,
}

impl SubmitJob {
    /// Name of the first required field that is absent or blank, in wire order.
    pub fn missing_field(&self) -> Option<&'static str> {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        let fields: [(&'static str, bool); 8] = [
            ("jobId", present(&self.job_id)),
            ("prompt", present(&self.prompt)),
            ("model", present(&self.model)),
            ("timestamp", present(&self.timestamp)),
            ("userId", present(&self.user_id)),
            ("action", present(&self.action)),
            ("timeout", self.timeout.is_some()),
            ("callbackUrl", present(&self.callback_url)),
        ];

        fields
            .into_iter()
            .find(|(_, present)| !present)
            .map(|(name, _)| name)
    }
}

/// Acknowledgment returned with `202 Accepted`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub status: String,
    pub job_id: String,
    pub message: String,
    pub action: String,
}

/// A queued or running job as seen by `GET /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub job_id: String,
    pub user_id: String,
    pub stage: JobStage,
    pub since: DateTime<Utc>,
}

/// Response of `GET /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsOverview {
    pub active: Vec<ActiveSession>,
    pub total: usize,
    pub max_parallel_jobs: usize,
    pub queue_capacity: usize,
}
