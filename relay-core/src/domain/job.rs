//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::ErrorKind;

/// One automation request tracked from acceptance to a terminal outcome.
///
/// Created by the dispatcher, mutated only by the worker that handles it.
/// The history row keyed by `id` is replaced, never appended, on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub model: String,
    pub action: String,
    /// Route segment the request arrived on (`/automation/<route>`)
    pub route: String,
    pub callback_url: String,
    /// Caller-supplied deadline in seconds; 0 means "use the service default"
    pub timeout_seconds: u64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// File name of the downloaded artifact, when there is one
    pub result_artifact: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl Job {
    /// Moves the job into `Processing`.
    pub fn start_processing(&mut self) {
        self.status = JobStatus::Processing;
    }

    /// Terminal success with a downloaded artifact.
    pub fn complete_with_artifact(&mut self, filename: impl Into<String>) {
        self.finish(JobStatus::CompletedWithArtifact);
        self.result_artifact = Some(filename.into());
    }

    /// Terminal soft success: automation ran but nothing was produced.
    pub fn complete_without_artifact(&mut self) {
        self.finish(JobStatus::CompletedNoArtifact);
    }

    /// Terminal failure.
    pub fn fail(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.finish(JobStatus::Failed);
        self.error = Some(message.into());
        self.error_kind = Some(kind);
    }

    fn finish(&mut self, status: JobStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }
}

/// Job lifecycle status
///
/// `Accepted -> Processing -> {CompletedWithArtifact | CompletedNoArtifact | Failed}`.
/// The three right-hand states are terminal; jobs are never retried by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Accepted,
    Processing,
    CompletedWithArtifact,
    CompletedNoArtifact,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::CompletedWithArtifact | JobStatus::CompletedNoArtifact | JobStatus::Failed
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Accepted, JobStatus::Processing) => true,
            (JobStatus::Accepted, JobStatus::Failed) => true,
            (JobStatus::Processing, next) => next.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Accepted => "accepted",
            JobStatus::Processing => "processing",
            JobStatus::CompletedWithArtifact => "completed_with_artifact",
            JobStatus::CompletedNoArtifact => "completed_no_artifact",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(JobStatus::Accepted),
            "processing" => Ok(JobStatus::Processing),
            "completed_with_artifact" => Ok(JobStatus::CompletedWithArtifact),
            "completed_no_artifact" => Ok(JobStatus::CompletedNoArtifact),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// Coarse progress marker for a job that is queued or running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Queued,
    WaitingForUser,
    StartingSession,
    LoggingIn,
    OpeningWorkspace,
    Generating,
    Polling,
}
