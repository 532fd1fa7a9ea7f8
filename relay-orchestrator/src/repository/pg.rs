//! Postgres-backed stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::domain::affinity::WorkspaceAffinity;
use relay_core::domain::credential::{CreditStatus, SecretRef, UserCredentialRecord};
use relay_core::domain::job::Job;
use relay_core::dto::user::UserStats;
use sqlx::PgPool;

use super::{
    CredentialStore, StateStore, StoreResult, affinity_repository, credential_repository,
    job_repository,
};

/// [`StateStore`] and [`CredentialStore`] over a Postgres pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StateStore for PgStore {
    async fn get_affinity(&self, user_id: &str) -> StoreResult<Option<String>> {
        Ok(affinity_repository::find(&self.pool, user_id).await?)
    }

    async fn set_affinity(&self, user_id: &str, workspace_id: &str) -> StoreResult<()> {
        Ok(affinity_repository::upsert(&self.pool, user_id, workspace_id).await?)
    }

    async fn replace_affinity(
        &self,
        user_id: &str,
        expected: Option<&str>,
        workspace_id: &str,
    ) -> StoreResult<bool> {
        Ok(affinity_repository::compare_and_swap(&self.pool, user_id, expected, workspace_id).await?)
    }

    async fn list_affinities(&self) -> StoreResult<Vec<WorkspaceAffinity>> {
        Ok(affinity_repository::list_all(&self.pool).await?)
    }

    async fn append_job_history(&self, job: &Job) -> StoreResult<()> {
        Ok(job_repository::upsert(&self.pool, job).await?)
    }

    async fn get_job(&self, job_id: &str) -> StoreResult<Option<Job>> {
        job_repository::find_by_id(&self.pool, job_id).await
    }

    async fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        job_repository::user_stats(&self.pool, user_id).await
    }

    async fn cleanup_history(&self, older_than: DateTime<Utc>) -> StoreResult<u64> {
        Ok(job_repository::delete_terminal_before(&self.pool, older_than).await?)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<UserCredentialRecord>> {
        credential_repository::find(&self.pool, user_id).await
    }

    async fn set(
        &self,
        user_id: &str,
        email: &str,
        secret_ref: &SecretRef,
    ) -> StoreResult<UserCredentialRecord> {
        credential_repository::upsert(&self.pool, user_id, email, secret_ref).await
    }

    async fn mark_onboarding_done(&self, user_id: &str) -> StoreResult<()> {
        Ok(credential_repository::clear_first_login(&self.pool, user_id).await?)
    }

    async fn set_credit_status(&self, user_id: &str, status: CreditStatus) -> StoreResult<bool> {
        Ok(credential_repository::update_credit_status(&self.pool, user_id, status).await?)
    }
}
