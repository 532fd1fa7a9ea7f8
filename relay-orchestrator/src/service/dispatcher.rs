//! Job dispatcher and worker pool
//!
//! `submit` validates a request, records it as accepted and hands it to a
//! bounded queue without waiting for it to run. The pool drains the queue
//! with at most `max_parallel_jobs` jobs in flight.

use chrono::Utc;
use relay_core::domain::job::{Job, JobStatus};
use relay_core::dto::job::{JobAccepted, SubmitJob};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::repository::{StateStore, StoreError};
use crate::service::registry::ActiveJobs;
use crate::service::worker::JobRunner;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Validation(String),

    #[error("Job {0} is already queued or running")]
    Duplicate(String),

    #[error("Job queue is full, try again later")]
    QueueFull,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Dispatcher {
    queue: mpsc::Sender<Job>,
    store: Arc<dyn StateStore>,
    active: Arc<ActiveJobs>,
}

impl Dispatcher {
    /// Creates a dispatcher and the receiving end of its queue.
    pub fn new(
        queue_capacity: usize,
        store: Arc<dyn StateStore>,
        active: Arc<ActiveJobs>,
    ) -> (Self, mpsc::Receiver<Job>) {
        let (queue, rx) = mpsc::channel(queue_capacity);
        (
            Self {
                queue,
                store,
                active,
            },
            rx,
        )
    }

    /// Accepts a job for asynchronous processing.
    pub async fn submit(&self, route: &str, request: SubmitJob) -> Result<JobAccepted, DispatchError> {
        let job = validate(route, request)?;

        if !self.active.try_register(&job.id, &job.user_id) {
            return Err(DispatchError::Duplicate(job.id));
        }

        let permit = match self.queue.try_reserve() {
            Ok(permit) => permit,
            Err(e) => {
                self.active.finish(&job.id);
                warn!("Rejecting job {}: {}", job.id, e);
                return Err(DispatchError::QueueFull);
            }
        };

        if let Err(e) = self.store.append_job_history(&job).await {
            self.active.finish(&job.id);
            return Err(e.into());
        }

        info!(
            "Accepted job {} for user {} on route {}",
            job.id, job.user_id, job.route
        );
        let accepted = JobAccepted {
            status: JobStatus::Accepted.as_str().to_string(),
            job_id: job.id.clone(),
            message: format!("Job {} accepted for processing", job.id),
            action: job.action.clone(),
        };
        permit.send(job);

        Ok(accepted)
    }
}

fn validate(route: &str, request: SubmitJob) -> Result<Job, DispatchError> {
    if let Some(field) = request.missing_field() {
        return Err(DispatchError::Validation(format!(
            "Missing required field: {}",
            field
        )));
    }

    let callback_url = request.callback_url.unwrap_or_default();
    if !callback_url.starts_with("http://") && !callback_url.starts_with("https://") {
        return Err(DispatchError::Validation(
            "callbackUrl must be an http or https URL".to_string(),
        ));
    }

    Ok(Job {
        id: request.job_id.unwrap_or_default(),
        user_id: request.user_id.unwrap_or_default(),
        prompt: request.prompt.unwrap_or_default(),
        model: request.model.unwrap_or_default(),
        action: request.action.unwrap_or_default(),
        route: route.to_string(),
        callback_url,
        timeout_seconds: request.timeout.unwrap_or_default(),
        status: JobStatus::Accepted,
        created_at: Utc::now(),
        completed_at: None,
        result_artifact: None,
        error: None,
        error_kind: None,
    })
}

/// Spawns the task that feeds queued jobs to the runner.
///
/// A permit is taken before a job is dequeued, so the queue alone holds the
/// jobs waiting for a worker.
pub fn spawn_worker_pool(
    mut queue: mpsc::Receiver<Job>,
    runner: Arc<JobRunner>,
    max_parallel_jobs: usize,
) -> JoinHandle<()> {
    let permits = Arc::new(Semaphore::new(max_parallel_jobs));

    tokio::spawn(async move {
        info!("Worker pool started with {} slot(s)", max_parallel_jobs);
        loop {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let Some(job) = queue.recv().await else {
                break;
            };
            debug!("Starting job {}", job.id);

            let runner = Arc::clone(&runner);
            tokio::spawn(async move {
                runner.run_to_completion(job).await;
                drop(permit);
            });
        }
        info!("Worker pool stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use crate::service::playbook::SitePlaybook;
    use crate::service::testing::{
        FakeDriver, FixedSecrets, RecordingNotifier, store_with_user, test_config,
    };
    use crate::service::worker::Collaborators;
    use relay_core::domain::callback::CallbackStatus;
    use std::time::Duration;

    fn request(job_id: &str, user_id: &str) -> SubmitJob {
        SubmitJob {
            job_id: Some(job_id.to_string()),
            prompt: Some("dog running in a park".to_string()),
            model: Some("video".to_string()),
            timestamp: Some("2025-08-27T18:15:00Z".to_string()),
            user_id: Some(user_id.to_string()),
            action: Some("create_project".to_string()),
            timeout: Some(300),
            callback_url: Some("http://caller.example.com/cb".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_queues_and_records_job() {
        let store = Arc::new(MemoryStore::new());
        let active = Arc::new(ActiveJobs::new());
        let (dispatcher, mut rx) = Dispatcher::new(4, store.clone(), active.clone());

        let accepted = dispatcher.submit("google-flow", request("J1", "U1")).await.unwrap();

        assert_eq!(accepted.status, "accepted");
        assert_eq!(accepted.job_id, "J1");
        assert_eq!(accepted.action, "create_project");

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.route, "google-flow");
        assert_eq!(queued.timeout_seconds, 300);

        let stored = store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Accepted);
        assert!(active.contains("J1"));
    }

    #[tokio::test]
    async fn test_missing_field_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let active = Arc::new(ActiveJobs::new());
        let (dispatcher, mut rx) = Dispatcher::new(4, store.clone(), active.clone());

        let mut req = request("J1", "U1");
        req.prompt = None;
        let err = dispatcher.submit("google-flow", req).await.unwrap_err();

        assert_eq!(err.to_string(), "Missing required field: prompt");
        assert!(rx.try_recv().is_err());
        assert!(store.get_job("J1").await.unwrap().is_none());
        assert!(!active.contains("J1"));
    }

    #[tokio::test]
    async fn test_rejects_non_http_callback() {
        let store = Arc::new(MemoryStore::new());
        let (dispatcher, _rx) = Dispatcher::new(4, store, Arc::new(ActiveJobs::new()));

        let mut req = request("J1", "U1");
        req.callback_url = Some("file:///etc/passwd".to_string());

        assert!(matches!(
            dispatcher.submit("google-flow", req).await,
            Err(DispatchError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_id_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let (dispatcher, _rx) = Dispatcher::new(4, store, Arc::new(ActiveJobs::new()));

        dispatcher.submit("google-flow", request("J1", "U1")).await.unwrap();
        let err = dispatcher
            .submit("google-flow", request("J1", "U1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Duplicate(id) if id == "J1"));
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_history() {
        let store = Arc::new(MemoryStore::new());
        let active = Arc::new(ActiveJobs::new());
        let (dispatcher, _rx) = Dispatcher::new(1, store.clone(), active.clone());

        dispatcher.submit("google-flow", request("J1", "U1")).await.unwrap();
        let err = dispatcher
            .submit("google-flow", request("J2", "U2"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::QueueFull));
        assert!(store.get_job("J2").await.unwrap().is_none());
        assert!(!active.contains("J2"));
    }

    #[tokio::test]
    async fn test_pool_runs_submitted_jobs() {
        let artifacts = tempfile::tempdir().unwrap();
        let profiles = tempfile::tempdir().unwrap();
        let config = Arc::new(test_config(artifacts.path(), profiles.path()));

        let store = store_with_user("U1").await;
        let driver = Arc::new(FakeDriver::new());
        driver.with(|s| s.artifact_after_checks = None);
        let notifier = Arc::new(RecordingNotifier::default());
        let active = Arc::new(ActiveJobs::new());

        let deps = Collaborators {
            driver,
            store: store.clone(),
            credentials: store.clone(),
            notifier: notifier.clone(),
            secrets: Arc::new(FixedSecrets),
            playbook: Arc::new(SitePlaybook::default()),
        };
        let runner = Arc::new(JobRunner::new(config, deps, active.clone()));
        let (dispatcher, rx) = Dispatcher::new(8, store.clone(), active.clone());
        let pool = spawn_worker_pool(rx, runner, 2);

        for id in ["J1", "J2", "J3"] {
            dispatcher.submit("google-flow", request(id, "U1")).await.unwrap();
        }

        for _ in 0..200 {
            if active.snapshot().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(active.snapshot().is_empty());
        for id in ["J1", "J2", "J3"] {
            assert_eq!(
                notifier.statuses(id),
                vec![CallbackStatus::Processing, CallbackStatus::Completed]
            );
            let stored = store.get_job(id).await.unwrap().unwrap();
            assert_eq!(stored.status, JobStatus::CompletedNoArtifact);
        }

        drop(dispatcher);
        pool.await.unwrap();
    }
}
