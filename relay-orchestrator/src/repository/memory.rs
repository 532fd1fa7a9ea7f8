//! In-process stores
//!
//! Used when no database is configured, and by tests. All maps sit behind a
//! single mutex so compare-and-swap is atomic with respect to every other write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::domain::affinity::WorkspaceAffinity;
use relay_core::domain::credential::{CreditStatus, SecretRef, UserCredentialRecord};
use relay_core::domain::job::{Job, JobStatus};
use relay_core::dto::user::UserStats;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{CredentialStore, StateStore, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    affinities: HashMap<String, WorkspaceAffinity>,
    credentials: HashMap<String, UserCredentialRecord>,
    jobs: HashMap<String, Job>,
}

/// [`StateStore`] and [`CredentialStore`] kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_affinity(&self, user_id: &str) -> StoreResult<Option<String>> {
        Ok(self
            .tables()
            .affinities
            .get(user_id)
            .map(|a| a.workspace_id.clone()))
    }

    async fn set_affinity(&self, user_id: &str, workspace_id: &str) -> StoreResult<()> {
        self.tables().affinities.insert(
            user_id.to_string(),
            WorkspaceAffinity {
                user_id: user_id.to_string(),
                workspace_id: workspace_id.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn replace_affinity(
        &self,
        user_id: &str,
        expected: Option<&str>,
        workspace_id: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.tables();
        let current = tables.affinities.get(user_id).map(|a| a.workspace_id.as_str());

        if current != expected {
            return Ok(false);
        }

        tables.affinities.insert(
            user_id.to_string(),
            WorkspaceAffinity {
                user_id: user_id.to_string(),
                workspace_id: workspace_id.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn list_affinities(&self) -> StoreResult<Vec<WorkspaceAffinity>> {
        let mut all: Vec<_> = self.tables().affinities.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn append_job_history(&self, job: &Job) -> StoreResult<()> {
        self.tables().jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> StoreResult<Option<Job>> {
        Ok(self.tables().jobs.get(job_id).cloned())
    }

    async fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        let tables = self.tables();
        let mut stats = UserStats {
            user_id: user_id.to_string(),
            credit_status: tables.credentials.get(user_id).map(|c| c.credit_status),
            ..Default::default()
        };

        for job in tables.jobs.values().filter(|j| j.user_id == user_id) {
            stats.total_jobs += 1;
            match job.status {
                JobStatus::CompletedWithArtifact => stats.completed_jobs += 1,
                JobStatus::CompletedNoArtifact => {
                    stats.completed_jobs += 1;
                    stats.no_artifact_jobs += 1;
                }
                JobStatus::Failed => stats.failed_jobs += 1,
                JobStatus::Accepted | JobStatus::Processing => {}
            }
        }

        Ok(stats)
    }

    async fn cleanup_history(&self, older_than: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables();
        let before = tables.jobs.len();
        tables
            .jobs
            .retain(|_, job| !(job.status.is_terminal() && job.created_at < older_than));
        Ok((before - tables.jobs.len()) as u64)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<UserCredentialRecord>> {
        Ok(self.tables().credentials.get(user_id).cloned())
    }

    async fn set(
        &self,
        user_id: &str,
        email: &str,
        secret_ref: &SecretRef,
    ) -> StoreResult<UserCredentialRecord> {
        let mut tables = self.tables();
        let now = Utc::now();

        let record = tables
            .credentials
            .entry(user_id.to_string())
            .and_modify(|r| {
                r.email = email.to_string();
                r.secret_ref = secret_ref.clone();
                r.updated_at = now;
            })
            .or_insert_with(|| UserCredentialRecord {
                user_id: user_id.to_string(),
                email: email.to_string(),
                secret_ref: secret_ref.clone(),
                credit_status: CreditStatus::Active,
                is_first_login: true,
                updated_at: now,
            });

        Ok(record.clone())
    }

    async fn mark_onboarding_done(&self, user_id: &str) -> StoreResult<()> {
        if let Some(record) = self.tables().credentials.get_mut(user_id) {
            record.is_first_login = false;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_credit_status(&self, user_id: &str, status: CreditStatus) -> StoreResult<bool> {
        match self.tables().credentials.get_mut(user_id) {
            Some(record) => {
                record.credit_status = status;
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
