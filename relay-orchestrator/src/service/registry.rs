//! Queued and running jobs
//!
//! Rejects a second dispatch of a job id that is still in flight and backs
//! the `/sessions` introspection endpoint.

use chrono::{DateTime, Utc};
use relay_core::domain::job::JobStage;
use relay_core::dto::job::ActiveSession;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone)]
struct Entry {
    user_id: String,
    stage: JobStage,
    since: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ActiveJobs {
    jobs: Mutex<HashMap<String, Entry>>,
}

impl ActiveJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job as queued. Returns false if the id is already in flight.
    pub fn try_register(&self, job_id: &str, user_id: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.contains_key(job_id) {
            return false;
        }
        jobs.insert(
            job_id.to_string(),
            Entry {
                user_id: user_id.to_string(),
                stage: JobStage::Queued,
                since: Utc::now(),
            },
        );
        true
    }

    pub fn set_stage(&self, job_id: &str, stage: JobStage) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = jobs.get_mut(job_id) {
            entry.stage = stage;
            entry.since = Utc::now();
        }
    }

    pub fn finish(&self, job_id: &str) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job_id);
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(job_id)
    }

    pub fn snapshot(&self) -> Vec<ActiveSession> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sessions: Vec<_> = jobs
            .iter()
            .map(|(job_id, entry)| ActiveSession {
                job_id: job_id.clone(),
                user_id: entry.user_id.clone(),
                stage: entry.stage,
                since: entry.since,
            })
            .collect();
        sessions.sort_by(|a, b| a.since.cmp(&b.since));
        sessions
    }
}
