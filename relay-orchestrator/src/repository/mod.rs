//! Repository Module
//!
//! Data access layer for the orchestrator. The service layer only sees the
//! [`StateStore`] and [`CredentialStore`] traits; [`PgStore`] backs them with
//! Postgres and [`MemoryStore`] keeps everything in process.

pub mod affinity;
pub mod credential;
pub mod job;
mod memory;
mod pg;

// Re-export for convenience
pub use affinity as affinity_repository;
pub use credential as credential_repository;
pub use job as job_repository;
pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::domain::affinity::WorkspaceAffinity;
use relay_core::domain::credential::{CreditStatus, SecretRef, UserCredentialRecord};
use relay_core::domain::job::Job;
use relay_core::dto::user::UserStats;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back to a domain value
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Affinity, job history and statistics
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_affinity(&self, user_id: &str) -> StoreResult<Option<String>>;

    /// Unconditional write (last write wins).
    async fn set_affinity(&self, user_id: &str, workspace_id: &str) -> StoreResult<()>;

    /// Compare-and-swap on the user's mapping.
    ///
    /// Writes `workspace_id` only if the current mapping equals `expected`
    /// (`None` meaning "no mapping yet"). Returns whether the write happened.
    async fn replace_affinity(
        &self,
        user_id: &str,
        expected: Option<&str>,
        workspace_id: &str,
    ) -> StoreResult<bool>;

    async fn list_affinities(&self) -> StoreResult<Vec<WorkspaceAffinity>>;

    /// Upserts the history row keyed by job id; a replayed id replaces the row.
    async fn append_job_history(&self, job: &Job) -> StoreResult<()>;

    async fn get_job(&self, job_id: &str) -> StoreResult<Option<Job>>;

    async fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats>;

    /// Deletes terminal history rows created before `older_than`.
    async fn cleanup_history(&self, older_than: DateTime<Utc>) -> StoreResult<u64>;
}

/// Per-user account credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, user_id: &str) -> StoreResult<Option<UserCredentialRecord>>;

    /// Creates or updates the record. New records start with `is_first_login`.
    async fn set(
        &self,
        user_id: &str,
        email: &str,
        secret_ref: &SecretRef,
    ) -> StoreResult<UserCredentialRecord>;

    async fn mark_onboarding_done(&self, user_id: &str) -> StoreResult<()>;

    /// Returns false when the user has no record.
    async fn set_credit_status(&self, user_id: &str, status: CreditStatus) -> StoreResult<bool>;
}
