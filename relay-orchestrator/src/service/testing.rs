//! Test doubles: a scripted site behind a fake driver, a recording
//! notifier and a fixed secret resolver.

use async_trait::async_trait;
use relay_core::domain::callback::{CallbackPayload, CallbackStatus};
use relay_core::domain::credential::SecretRef;
use relay_core::domain::job::{Job, JobStatus};
use relay_driver::{
    AutomationDriver, DriverError, Element, ElementLocator, Locator, SessionHandle,
};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{AutomationTimings, Config, PollSettings, RetryPolicies};
use crate::repository::{CredentialStore, MemoryStore};
use crate::service::error::Result;
use crate::service::notifier::CallbackNotifier;
use crate::service::playbook::SitePlaybook;
use crate::service::retry::RetryPolicy;
use crate::service::secrets::{Secret, SecretError, SecretResolver};

pub const SIGN_IN_URL: &str = "https://accounts.example.com/signin/v2/identifier";

/// Mutable state of the scripted site
#[derive(Debug)]
pub struct SiteState {
    pub logged_in: bool,
    pub login_succeeds: bool,
    pub email_field_present: bool,
    pub onboarding_shown: bool,
    pub onboarding_clicked: bool,
    pub location: String,
    pub workspaces: HashSet<String>,
    pub created_workspaces: u32,
    pub trigger_disabled: bool,
    pub credit_notice: bool,
    pub generation_started: bool,
    pub artifact_checks: u32,
    /// Artifact becomes visible on this check
    pub artifact_after_checks: Option<u32>,
    pub artifact_url: String,
    /// Every navigation hangs
    pub stall: bool,
    /// Number of `start_session` calls that fail before one succeeds
    pub failing_session_starts: u32,
    /// Time `start_session` takes before it answers
    pub start_delay: Duration,
    /// `start_session` panics
    pub panic_on_start: bool,
    pub sessions_started: u32,
    pub sessions_stopped: u32,
    pub open_sessions: u32,
    pub max_concurrent_sessions: u32,
    pub profiles: Vec<PathBuf>,
    pub typed: Vec<(String, String)>,
    pub scripts_evaluated: u32,
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            logged_in: false,
            login_succeeds: true,
            email_field_present: true,
            onboarding_shown: false,
            onboarding_clicked: false,
            location: "about:blank".to_string(),
            workspaces: HashSet::new(),
            created_workspaces: 0,
            trigger_disabled: false,
            credit_notice: false,
            generation_started: false,
            artifact_checks: 0,
            artifact_after_checks: Some(1),
            artifact_url: "http://127.0.0.1:9/video.mp4".to_string(),
            stall: false,
            failing_session_starts: 0,
            start_delay: Duration::ZERO,
            panic_on_start: false,
            sessions_started: 0,
            sessions_stopped: 0,
            open_sessions: 0,
            max_concurrent_sessions: 0,
            profiles: Vec::new(),
            typed: Vec::new(),
            scripts_evaluated: 0,
        }
    }
}

/// Driver that simulates the site described by the default playbook
#[derive(Debug)]
pub struct FakeDriver {
    pub playbook: SitePlaybook,
    pub state: Mutex<SiteState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            playbook: SitePlaybook::default(),
            state: Mutex::new(SiteState::default()),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut SiteState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    fn element(session: &SessionHandle, name: &str) -> Element {
        Element {
            session_id: session.id.clone(),
            id: name.to_string(),
        }
    }

    fn on_workspace(&self, state: &SiteState) -> bool {
        state
            .location
            .starts_with(&self.playbook.workspace_url_prefix)
    }
}

#[async_trait]
impl AutomationDriver for FakeDriver {
    async fn start_session(&self, profile: &Path) -> relay_driver::Result<SessionHandle> {
        let (delay, panics) = self.with(|s| (s.start_delay, s.panic_on_start));
        if panics {
            panic!("browser process crashed");
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();

        if state.failing_session_starts > 0 {
            state.failing_session_starts -= 1;
            return Err(DriverError::SessionNotCreated("browser crashed".to_string()));
        }

        state.sessions_started += 1;
        state.open_sessions += 1;
        state.max_concurrent_sessions = state.max_concurrent_sessions.max(state.open_sessions);
        state.profiles.push(profile.to_path_buf());
        state.location = "about:blank".to_string();

        Ok(SessionHandle {
            id: format!("S{}", state.sessions_started),
            profile: profile.to_path_buf(),
        })
    }

    async fn navigate(&self, _session: &SessionHandle, url: &str) -> relay_driver::Result<()> {
        if self.with(|s| s.stall) {
            std::future::pending::<()>().await;
        }
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        state.location = if url == self.playbook.account_url {
            if state.logged_in {
                url.to_string()
            } else {
                SIGN_IN_URL.to_string()
            }
        } else if let Some(id) = url.strip_prefix(&self.playbook.workspace_url_prefix) {
            if state.workspaces.contains(id) {
                url.to_string()
            } else {
                self.playbook.home_url.clone()
            }
        } else {
            url.to_string()
        };
        Ok(())
    }

    async fn current_location(&self, _session: &SessionHandle) -> relay_driver::Result<String> {
        Ok(self.with(|s| s.location.clone()))
    }

    async fn find(
        &self,
        _session: &SessionHandle,
        _locator: &Locator,
    ) -> relay_driver::Result<Option<Element>> {
        Ok(None)
    }

    async fn locate(
        &self,
        session: &SessionHandle,
        target: &ElementLocator,
    ) -> relay_driver::Result<Option<Element>> {
        let mut state = self.state.lock().unwrap();
        let on_sign_in = state.location == SIGN_IN_URL;

        let visible = match target.name.as_str() {
            "email_field" => on_sign_in && state.email_field_present,
            "email_next" | "password_field" | "password_next" => on_sign_in,
            "onboarding" => state.onboarding_shown,
            "new_workspace" => state.location == self.playbook.home_url,
            "prompt_input" | "generate_button" => self.on_workspace(&state),
            "credit_notice" => state.credit_notice && state.generation_started,
            "artifact" => {
                state.artifact_checks += 1;
                let checks = state.artifact_checks;
                state.artifact_after_checks.is_some_and(|n| checks >= n)
            }
            _ => false,
        };

        Ok(visible.then(|| Self::element(session, &target.name)))
    }

    async fn type_text(&self, element: &Element, text: &str) -> relay_driver::Result<()> {
        self.with(|s| s.typed.push((element.id.clone(), text.to_string())));
        Ok(())
    }

    async fn click(&self, element: &Element) -> relay_driver::Result<()> {
        let mut state = self.state.lock().unwrap();
        match element.id.as_str() {
            "password_next" => {
                state.logged_in = state.login_succeeds;
                state.location = if state.logged_in {
                    self.playbook.account_url.clone()
                } else {
                    SIGN_IN_URL.to_string()
                };
            }
            "new_workspace" => {
                state.created_workspaces += 1;
                let id = format!("ws-{}", state.created_workspaces);
                state.workspaces.insert(id.clone());
                state.location = format!("{}?pli=1", self.playbook.workspace_url(&id));
            }
            "generate_button" => state.generation_started = true,
            "onboarding" => {
                state.onboarding_clicked = true;
                state.onboarding_shown = false;
            }
            _ => {}
        }
        Ok(())
    }

    async fn read_attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> relay_driver::Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(match (element.id.as_str(), name) {
            ("generate_button", "disabled") => state.trigger_disabled.then(|| "true".to_string()),
            ("artifact", "src") => Some(state.artifact_url.clone()),
            _ => None,
        })
    }

    async fn evaluate(&self, _session: &SessionHandle, _script: &str) -> relay_driver::Result<Value> {
        self.with(|s| s.scripts_evaluated += 1);
        Ok(Value::Null)
    }

    async fn stop(&self, _session: SessionHandle) -> relay_driver::Result<()> {
        self.with(|s| {
            s.open_sessions -= 1;
            s.sessions_stopped += 1;
        });
        Ok(())
    }
}

/// Records every callback instead of sending it
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, CallbackPayload)>>,
}

impl RecordingNotifier {
    pub fn statuses(&self, job_id: &str) -> Vec<CallbackStatus> {
        self.payloads(job_id).iter().map(|p| p.status).collect()
    }

    pub fn payloads(&self, job_id: &str) -> Vec<CallbackPayload> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p)| p.job_id == job_id)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl CallbackNotifier for RecordingNotifier {
    async fn notify(&self, url: &str, payload: &CallbackPayload) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        Ok(())
    }
}

/// Resolves every reference to the same secret
#[derive(Debug, Default)]
pub struct FixedSecrets;

#[async_trait]
impl SecretResolver for FixedSecrets {
    async fn resolve(&self, _reference: &SecretRef) -> std::result::Result<Secret, SecretError> {
        Ok(Secret::new("correct horse"))
    }
}

/// Configuration with no pacing and instant retries
pub fn test_config(artifact_dir: &Path, profile_root: &Path) -> Config {
    let instant = RetryPolicy::new(2, Duration::ZERO, Duration::ZERO);
    Config {
        artifact_dir: artifact_dir.to_path_buf(),
        profile_root: profile_root.to_path_buf(),
        poll: PollSettings {
            grace: Duration::ZERO,
            interval: Duration::ZERO,
            max_attempts: 3,
        },
        retry: RetryPolicies {
            session: RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
            login: instant,
            navigation: instant,
            callback: instant,
        },
        timings: AutomationTimings::immediate(),
        ..Config::default()
    }
}

/// Memory store with credentials registered for `user_id`
pub async fn store_with_user(user_id: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            user_id,
            &format!("{}@example.com", user_id.to_lowercase()),
            &SecretRef::new(format!("env:{}_PASSWORD", user_id)),
        )
        .await
        .unwrap();
    store
}

pub fn job(id: &str, user_id: &str) -> Job {
    Job {
        id: id.to_string(),
        user_id: user_id.to_string(),
        prompt: "dog running in a park".to_string(),
        model: "video".to_string(),
        action: "create_project".to_string(),
        route: "google-flow".to_string(),
        callback_url: "http://caller.example.com/cb".to_string(),
        timeout_seconds: 300,
        status: JobStatus::Accepted,
        created_at: chrono::Utc::now(),
        completed_at: None,
        result_artifact: None,
        error: None,
        error_kind: None,
    }
}
