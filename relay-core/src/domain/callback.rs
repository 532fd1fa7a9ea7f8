//! Outbound lifecycle callbacks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::ErrorKind;

/// `resultUrl` value reported when a job completed without producing an artifact.
pub const NO_ARTIFACT_RESULT: &str = "no_artifact";

/// Status carried by a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Processing,
    Completed,
    Failed,
}

/// Body POSTed to the caller's callback URL on every lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub job_id: String,
    pub status: CallbackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub timestamp: DateTime<Utc>,
}

impl CallbackPayload {
    pub fn processing(job_id: impl Into<String>) -> Self {
        Self::new(job_id, CallbackStatus::Processing)
    }

    pub fn completed(job_id: impl Into<String>, result_url: impl Into<String>) -> Self {
        Self {
            result_url: Some(result_url.into()),
            ..Self::new(job_id, CallbackStatus::Completed)
        }
    }

    pub fn completed_without_artifact(job_id: impl Into<String>) -> Self {
        Self::completed(job_id, NO_ARTIFACT_RESULT)
    }

    pub fn failed(job_id: impl Into<String>, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            error_kind: Some(kind),
            ..Self::new(job_id, CallbackStatus::Failed)
        }
    }

    fn new(job_id: impl Into<String>, status: CallbackStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            result_url: None,
            error: None,
            error_kind: None,
            timestamp: Utc::now(),
        }
    }
}
