//! Job worker
//!
//! Runs one job from `processing` to a terminal state:
//!
//! 1. take the profile lock (one session per profile directory)
//! 2. record `processing` and send the processing callback
//! 3. start a session, sign in, open the workspace, trigger generation, poll
//! 4. stop the session, record the outcome, send the terminal callback
//!
//! Step 3 runs under the job deadline. When it elapses every pending driver
//! call, wait or download is dropped and the job fails with a timeout. A
//! session start cut off by the deadline is awaited (bounded) so the session
//! it yields can be stopped.

use relay_core::domain::callback::CallbackPayload;
use relay_core::domain::credential::CreditStatus;
use relay_core::domain::error::ErrorKind;
use relay_core::domain::job::{Job, JobStage};
use relay_driver::{AutomationDriver, SessionHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep_until, timeout, timeout_at};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::repository::{CredentialStore, StateStore};
use crate::service::error::{AutomationError, Result};
use crate::service::generation::{GenerationOutcome, GenerationStep};
use crate::service::locks::UserLocks;
use crate::service::login::LoginCoordinator;
use crate::service::notifier::CallbackNotifier;
use crate::service::playbook::SitePlaybook;
use crate::service::poller::CompletionPoller;
use crate::service::registry::ActiveJobs;
use crate::service::retry::with_backoff;
use crate::service::secrets::SecretResolver;
use crate::service::workspace::WorkspaceManager;

/// Upper bound on closing a session, deadline or not
const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a worker talks to
#[derive(Clone)]
pub struct Collaborators {
    pub driver: Arc<dyn AutomationDriver>,
    pub store: Arc<dyn StateStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub notifier: Arc<dyn CallbackNotifier>,
    pub secrets: Arc<dyn SecretResolver>,
    pub playbook: Arc<SitePlaybook>,
}

/// How a job ended when no step failed
#[derive(Debug, Clone, PartialEq, Eq)]
enum JobOutcome {
    Artifact(String),
    NoArtifact(&'static str),
}

pub struct JobRunner {
    config: Arc<Config>,
    driver: Arc<dyn AutomationDriver>,
    store: Arc<dyn StateStore>,
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn CallbackNotifier>,
    playbook: Arc<SitePlaybook>,
    locks: UserLocks,
    active: Arc<ActiveJobs>,
    login: LoginCoordinator,
    workspaces: WorkspaceManager,
    generation: GenerationStep,
    poller: CompletionPoller,
}

impl JobRunner {
    pub fn new(config: Arc<Config>, deps: Collaborators, active: Arc<ActiveJobs>) -> Self {
        let timings = config.timings;

        let login = LoginCoordinator::new(
            Arc::clone(&deps.driver),
            Arc::clone(&deps.credentials),
            Arc::clone(&deps.secrets),
            Arc::clone(&deps.playbook),
            timings,
        );
        let workspaces = WorkspaceManager::new(
            Arc::clone(&deps.driver),
            Arc::clone(&deps.store),
            Arc::clone(&deps.credentials),
            Arc::clone(&deps.playbook),
            timings,
        );
        let generation =
            GenerationStep::new(Arc::clone(&deps.driver), Arc::clone(&deps.playbook), timings);
        let poller = CompletionPoller::new(
            Arc::clone(&deps.driver),
            reqwest::Client::new(),
            config.poll,
            config.artifact_dir.clone(),
            deps.playbook.locators.artifact.clone(),
        );

        Self {
            config,
            driver: deps.driver,
            store: deps.store,
            credentials: deps.credentials,
            notifier: deps.notifier,
            playbook: deps.playbook,
            locks: UserLocks::new(),
            active,
            login,
            workspaces,
            generation,
            poller,
        }
    }

    /// Runs `job` to completion. Never fails; every outcome ends in the
    /// history row and a terminal callback.
    pub async fn run(&self, mut job: Job) {
        self.active.set_stage(&job.id, JobStage::WaitingForUser);
        let _profile_guard = self.locks.acquire(&profile_key(&job.user_id)).await;

        info!("Processing job {} for user {}", job.id, job.user_id);
        job.start_processing();
        self.record(&job).await;
        self.notify(&job, CallbackPayload::processing(&job.id)).await;

        let limit = self.config.job_timeout(job.timeout_seconds);
        let deadline = Instant::now() + limit;

        let payload = match self.execute(&job, deadline, limit).await {
            Ok(JobOutcome::Artifact(filename)) => {
                info!("Job {} completed with artifact {}", job.id, filename);
                let url = self.config.artifact_url(&filename);
                job.complete_with_artifact(filename);
                CallbackPayload::completed(&job.id, url)
            }
            Ok(JobOutcome::NoArtifact(reason)) => {
                info!("Job {} completed without artifact: {}", job.id, reason);
                job.complete_without_artifact();
                self.mark_credits_exhausted(&job.user_id).await;
                CallbackPayload::completed_without_artifact(&job.id)
            }
            Err(e) => {
                error!("Job {} for user {} failed: {}", job.id, job.user_id, e);
                job.fail(e.kind(), e.to_string());
                CallbackPayload::failed(&job.id, e.kind(), e.to_string())
            }
        };

        self.record(&job).await;
        self.notify(&job, payload).await;
        self.active.finish(&job.id);
    }

    /// Runs `job` on its own task. A worker that panics still leaves a
    /// failed history row and a failure callback behind.
    pub async fn run_to_completion(self: Arc<Self>, job: Job) {
        let mut aborted = job.clone();
        let runner = Arc::clone(&self);
        let worker = tokio::spawn(async move { runner.run(job).await });
        let Err(e) = worker.await else {
            return;
        };

        error!("Worker for job {} aborted: {}", aborted.id, e);
        match self.store.get_job(&aborted.id).await {
            Ok(Some(stored)) if stored.status.is_terminal() => {
                self.active.finish(&aborted.id);
                return;
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read job {} after abort: {}", aborted.id, e),
        }

        let message = format!("worker aborted: {}", e);
        aborted.start_processing();
        aborted.fail(ErrorKind::Internal, message.clone());
        self.record(&aborted).await;
        self.notify(
            &aborted,
            CallbackPayload::failed(&aborted.id, ErrorKind::Internal, message),
        )
        .await;
        self.active.finish(&aborted.id);
    }

    async fn execute(&self, job: &Job, deadline: Instant, limit: Duration) -> Result<JobOutcome> {
        self.active.set_stage(&job.id, JobStage::StartingSession);

        // A start cut off by the deadline may still yield a session; let it
        // land so it can be closed.
        let start = self.start_session(&job.user_id);
        tokio::pin!(start);
        let session = tokio::select! {
            biased;
            started = &mut start => started?,
            _ = sleep_until(deadline) => {
                warn!("Job {} reached its deadline while starting a session", job.id);
                if let Ok(Ok(session)) = timeout(STOP_TIMEOUT, &mut start).await {
                    self.stop_session(session, &job.id).await;
                }
                return Err(AutomationError::Timeout(limit));
            }
        };

        let outcome = timeout_at(deadline, self.drive(&session, job))
            .await
            .map_err(|_| AutomationError::Timeout(limit))
            .and_then(|r| r);

        self.stop_session(session, &job.id).await;
        outcome
    }

    async fn stop_session(&self, session: SessionHandle, job_id: &str) {
        let session_id = session.id.clone();
        match timeout(STOP_TIMEOUT, self.driver.stop(session)).await {
            Ok(Ok(())) => debug!("Session {} for job {} stopped", session_id, job_id),
            Ok(Err(e)) => warn!("Failed to stop session {}: {}", session_id, e),
            Err(_) => warn!("Timed out stopping session {}", session_id),
        }
    }

    async fn start_session(&self, user_id: &str) -> Result<SessionHandle> {
        let profile = self.profile_dir(user_id);
        tokio::fs::create_dir_all(&profile).await.map_err(|e| {
            AutomationError::Session(format!("creating profile {}: {}", profile.display(), e))
        })?;

        let driver = &self.driver;
        let profile = profile.as_path();
        let session = with_backoff(
            &self.config.retry.session,
            "session start",
            move || async move {
                driver
                    .start_session(profile)
                    .await
                    .map_err(|e| AutomationError::Session(e.to_string()))
            },
            AutomationError::is_retryable,
        )
        .await?;

        if let Err(e) = self
            .driver
            .evaluate(&session, &self.playbook.stealth_script)
            .await
        {
            warn!("Stealth initialisation failed for session {}: {}", session.id, e);
        }

        Ok(session)
    }

    async fn drive(&self, session: &SessionHandle, job: &Job) -> Result<JobOutcome> {
        let user_id = job.user_id.as_str();

        self.active.set_stage(&job.id, JobStage::LoggingIn);
        with_backoff(
            &self.config.retry.login,
            "login",
            move || async move {
                self.login
                    .ensure_logged_in(session, user_id)
                    .await
                    .into_result()
            },
            AutomationError::is_retryable,
        )
        .await?;

        self.active.set_stage(&job.id, JobStage::OpeningWorkspace);
        let workspace_id = with_backoff(
            &self.config.retry.navigation,
            "workspace",
            move || async move { self.workspaces.get_or_create(session, user_id).await },
            AutomationError::is_retryable,
        )
        .await?;
        info!("Job {} using workspace {}", job.id, workspace_id);

        self.active.set_stage(&job.id, JobStage::Generating);
        match self.generation.run(session, &job.prompt).await? {
            GenerationOutcome::Started => {}
            GenerationOutcome::TriggerDisabled => {
                return Ok(JobOutcome::NoArtifact("generate control disabled"));
            }
            GenerationOutcome::CreditNotice => {
                return Ok(JobOutcome::NoArtifact("credit notice shown"));
            }
        }

        self.active.set_stage(&job.id, JobStage::Polling);
        Ok(
            match self.poller.wait_for_artifact(session, &job.prompt).await? {
                Some(filename) => JobOutcome::Artifact(filename),
                None => JobOutcome::NoArtifact("no artifact before polling ran out"),
            },
        )
    }

    fn profile_dir(&self, user_id: &str) -> PathBuf {
        self.config.profile_root.join(profile_key(user_id))
    }

    async fn mark_credits_exhausted(&self, user_id: &str) {
        match self
            .credentials
            .set_credit_status(user_id, CreditStatus::Exhausted)
            .await
        {
            Ok(true) => info!("Marked credits exhausted for user {}", user_id),
            Ok(false) => debug!("No credential record for user {}", user_id),
            Err(e) => warn!("Failed to update credit status for user {}: {}", user_id, e),
        }
    }

    async fn record(&self, job: &Job) {
        if let Err(e) = self.store.append_job_history(job).await {
            error!("Failed to record job {} as {}: {}", job.id, job.status, e);
        }
    }

    /// Delivery failures are logged and never change the job outcome.
    async fn notify(&self, job: &Job, payload: CallbackPayload) {
        if let Err(e) = self.notifier.notify(&job.callback_url, &payload).await {
            warn!("Callback for job {} not delivered: {}", job.id, e);
        }
    }
}

/// Directory name of a user's browser profile, also the key of its lock.
///
/// Ids made only of `[A-Za-z0-9_-]` keep their readable `user_<id>` form.
/// Any other id is hex-encoded behind a `user.` prefix, which no plain id can
/// produce, so distinct ids never share a profile.
fn profile_key(user_id: &str) -> String {
    let plain = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        return format!("user_{}", user_id);
    }

    let mut key = String::with_capacity(5 + user_id.len() * 2);
    key.push_str("user.");
    for byte in user_id.bytes() {
        key.push_str(&format!("{:02x}", byte));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use crate::service::testing::{
        FakeDriver, FixedSecrets, RecordingNotifier, job, store_with_user, test_config,
    };
    use relay_core::domain::callback::{CallbackStatus, NO_ARTIFACT_RESULT};
    use relay_core::domain::credential::SecretRef;
    use relay_core::domain::job::JobStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        driver: Arc<FakeDriver>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        active: Arc<ActiveJobs>,
        runner: Arc<JobRunner>,
        artifacts: tempfile::TempDir,
        _profiles: tempfile::TempDir,
    }

    async fn harness(configure: impl FnOnce(&mut Config)) -> Harness {
        let artifacts = tempfile::tempdir().unwrap();
        let profiles = tempfile::tempdir().unwrap();
        let mut config = test_config(artifacts.path(), profiles.path());
        configure(&mut config);

        let driver = Arc::new(FakeDriver::new());
        let store = store_with_user("U1").await;
        let notifier = Arc::new(RecordingNotifier::default());
        let active = Arc::new(ActiveJobs::new());

        let deps = Collaborators {
            driver: driver.clone(),
            store: store.clone(),
            credentials: store.clone(),
            notifier: notifier.clone(),
            secrets: Arc::new(FixedSecrets),
            playbook: Arc::new(SitePlaybook::default()),
        };
        let runner = Arc::new(JobRunner::new(Arc::new(config), deps, active.clone()));

        Harness {
            driver,
            store,
            notifier,
            active,
            runner,
            artifacts,
            _profiles: profiles,
        }
    }

    async fn serve_artifact(h: &Harness) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4".to_vec()))
            .mount(&server)
            .await;
        let url = format!("{}/v.mp4", server.uri());
        h.driver.with(|s| s.artifact_url = url);
        server
    }

    #[tokio::test]
    async fn test_happy_path_delivers_artifact() {
        let h = harness(|_| {}).await;
        let _server = serve_artifact(&h).await;
        h.active.try_register("J1", "U1");

        h.runner.run(job("J1", "U1")).await;

        let payloads = h.notifier.payloads("J1");
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].status, CallbackStatus::Processing);
        assert_eq!(payloads[1].status, CallbackStatus::Completed);
        let url = payloads[1].result_url.clone().unwrap();
        assert!(url.starts_with("http://localhost:8080/videos/video_dog_running_in_a_par_"));

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::CompletedWithArtifact);
        let file = stored.result_artifact.unwrap();
        assert!(h.artifacts.path().join(&file).exists());

        assert_eq!(h.store.get_affinity("U1").await.unwrap().as_deref(), Some("ws-1"));
        h.driver.with(|s| {
            assert_eq!(s.sessions_started, 1);
            assert_eq!(s.sessions_stopped, 1);
            assert_eq!(s.scripts_evaluated, 1);
        });
        assert!(!h.active.contains("J1"));
    }

    #[tokio::test]
    async fn test_exhausted_polling_is_soft_completion() {
        let h = harness(|_| {}).await;
        h.driver.with(|s| s.artifact_after_checks = None);

        h.runner.run(job("J1", "U1")).await;

        let payloads = h.notifier.payloads("J1");
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1].status, CallbackStatus::Completed);
        assert_eq!(payloads[1].result_url.as_deref(), Some(NO_ARTIFACT_RESULT));

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::CompletedNoArtifact);
        let stats = h.store.get_user_stats("U1").await.unwrap();
        assert_eq!(stats.credit_status, Some(CreditStatus::Exhausted));
    }

    #[tokio::test]
    async fn test_disabled_trigger_skips_polling() {
        let h = harness(|_| {}).await;
        h.driver.with(|s| s.trigger_disabled = true);

        h.runner.run(job("J1", "U1")).await;

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::CompletedNoArtifact);
        assert_eq!(h.driver.with(|s| s.artifact_checks), 0);
    }

    #[tokio::test]
    async fn test_missing_login_field_fails_job() {
        let h = harness(|_| {}).await;
        h.driver.with(|s| s.email_field_present = false);

        h.runner.run(job("J1", "U1")).await;

        let payloads = h.notifier.payloads("J1");
        assert_eq!(
            payloads.iter().map(|p| p.status).collect::<Vec<_>>(),
            vec![CallbackStatus::Processing, CallbackStatus::Failed]
        );
        assert_eq!(payloads[1].error_kind, Some(ErrorKind::Login));
        assert!(payloads[1].error.as_deref().unwrap().contains("email_field"));

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_kind, Some(ErrorKind::Login));
        assert_eq!(h.driver.with(|s| s.open_sessions), 0);
    }

    #[tokio::test]
    async fn test_stale_affinity_is_replaced() {
        let h = harness(|_| {}).await;
        let _server = serve_artifact(&h).await;
        h.store.set_affinity("U1", "ws-gone").await.unwrap();

        h.runner.run(job("J1", "U1")).await;

        assert_eq!(h.store.get_affinity("U1").await.unwrap().as_deref(), Some("ws-1"));
        assert_eq!(h.store.list_affinities().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_start_is_retried() {
        let h = harness(|_| {}).await;
        let _server = serve_artifact(&h).await;
        h.driver.with(|s| s.failing_session_starts = 2);

        h.runner.run(job("J1", "U1")).await;

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::CompletedWithArtifact);
    }

    #[tokio::test]
    async fn test_session_start_gives_up_after_policy() {
        let h = harness(|_| {}).await;
        h.driver.with(|s| s.failing_session_starts = 10);

        h.runner.run(job("J1", "U1")).await;

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_kind, Some(ErrorKind::Session));
        assert_eq!(h.notifier.statuses("J1").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_and_stops_session() {
        let h = harness(|_| {}).await;
        h.driver.with(|s| s.stall = true);
        let mut stalled = job("J1", "U1");
        stalled.timeout_seconds = 5;

        h.runner.run(stalled).await;

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_kind, Some(ErrorKind::Timeout));
        h.driver.with(|s| {
            assert_eq!(s.sessions_started, 1);
            assert_eq!(s.sessions_stopped, 1);
        });
        let payloads = h.notifier.payloads("J1");
        assert_eq!(payloads[1].error_kind, Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_same_user_jobs_never_share_a_session() {
        let h = harness(|_| {}).await;
        let _server = serve_artifact(&h).await;

        let first = {
            let runner = Arc::clone(&h.runner);
            tokio::spawn(async move { runner.run(job("J1", "U1")).await })
        };
        let second = {
            let runner = Arc::clone(&h.runner);
            tokio::spawn(async move { runner.run(job("J2", "U1")).await })
        };
        first.await.unwrap();
        second.await.unwrap();

        h.driver.with(|s| {
            assert_eq!(s.sessions_started, 2);
            assert_eq!(s.max_concurrent_sessions, 1);
        });
        // The second job reuses the first job's workspace
        assert_eq!(h.driver.with(|s| s.created_workspaces), 1);
        assert_eq!(h.notifier.count(), 4);
    }

    #[test]
    fn test_profile_dir_is_path_safe() {
        let config = Arc::new(test_config(
            std::path::Path::new("/a"),
            std::path::Path::new("/profiles"),
        ));
        let store = Arc::new(MemoryStore::new());
        let deps = Collaborators {
            driver: Arc::new(FakeDriver::new()),
            store: store.clone(),
            credentials: store,
            notifier: Arc::new(RecordingNotifier::default()),
            secrets: Arc::new(FixedSecrets),
            playbook: Arc::new(SitePlaybook::default()),
        };
        let runner = JobRunner::new(config, deps, Arc::new(ActiveJobs::new()));

        assert_eq!(
            runner.profile_dir("../../etc"),
            PathBuf::from("/profiles/user.2e2e2f2e2e2f657463")
        );
        assert_eq!(runner.profile_dir("U1"), PathBuf::from("/profiles/user_U1"));
    }

    #[test]
    fn test_profile_key_keeps_distinct_ids_apart() {
        assert_eq!(profile_key("a_b"), "user_a_b");
        assert_eq!(profile_key("a.b"), "user.612e62");
        assert_eq!(profile_key("a/b"), "user.612f62");
        assert_eq!(profile_key(""), "user.");
        // A plain id that spells out another id's encoding stays distinct
        assert_ne!(profile_key("612e62"), profile_key("a.b"));

        for id in ["../../etc", "a b", "üser", "a.b"] {
            let key = profile_key(id);
            assert!(!key.contains('/'));
            assert!(key.starts_with("user."));
        }
    }

    #[tokio::test]
    async fn test_ids_differing_only_in_unsafe_chars_use_separate_profiles() {
        let h = harness(|_| {}).await;
        for user in ["a.b", "a_b"] {
            h.store
                .set(user, "shared@example.com", &SecretRef::new("env:SHARED_PASSWORD"))
                .await
                .unwrap();
        }

        h.runner.run(job("J1", "a.b")).await;
        h.runner.run(job("J2", "a_b")).await;

        let profiles = h.driver.with(|s| s.profiles.clone());
        assert_eq!(profiles.len(), 2);
        assert_ne!(profiles[0], profiles[1]);
        assert!(profiles[0].ends_with("user.612e62"));
        assert!(profiles[1].ends_with("user_a_b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_started_after_deadline_is_stopped() {
        let h = harness(|_| {}).await;
        h.driver.with(|s| s.start_delay = Duration::from_secs(10));
        let mut slow = job("J1", "U1");
        slow.timeout_seconds = 5;

        h.runner.run(slow).await;

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_kind, Some(ErrorKind::Timeout));
        h.driver.with(|s| {
            assert_eq!(s.sessions_started, 1);
            assert_eq!(s.sessions_stopped, 1);
            assert_eq!(s.open_sessions, 0);
        });
    }

    #[tokio::test]
    async fn test_panicking_worker_still_fails_job() {
        let h = harness(|_| {}).await;
        h.driver.with(|s| s.panic_on_start = true);
        h.active.try_register("J1", "U1");

        Arc::clone(&h.runner).run_to_completion(job("J1", "U1")).await;

        let payloads = h.notifier.payloads("J1");
        assert_eq!(
            payloads.iter().map(|p| p.status).collect::<Vec<_>>(),
            vec![CallbackStatus::Processing, CallbackStatus::Failed]
        );
        assert_eq!(payloads[1].error_kind, Some(ErrorKind::Internal));

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_kind, Some(ErrorKind::Internal));
        assert!(stored.completed_at.is_some());
        assert!(!h.active.contains("J1"));
    }

    #[tokio::test]
    async fn test_finished_job_is_left_alone_by_completion_wrapper() {
        let h = harness(|_| {}).await;
        let _server = serve_artifact(&h).await;

        Arc::clone(&h.runner).run_to_completion(job("J1", "U1")).await;

        let stored = h.store.get_job("J1").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::CompletedWithArtifact);
        assert_eq!(h.notifier.payloads("J1").len(), 2);
    }
}
