//! Login Coordinator
//!
//! Works out whether a session's profile is already authenticated and, if
//! not, signs in with the user's registered credentials.
//!
//! States: `Unknown -> Checking -> {Authenticated, Unauthenticated}`, then on
//! a login attempt `-> {Authenticated, Error}`. Failures never escape as
//! errors; they come back as [`LoginOutcome::Failed`] with the cause.

use rand::Rng;
use relay_driver::{AutomationDriver, Element, ElementLocator, SessionHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AutomationTimings;
use crate::repository::CredentialStore;
use crate::service::error::{AutomationError, Result};
use crate::service::playbook::{Location, SitePlaybook};
use crate::service::secrets::SecretResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
    Error,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated,
    Failed(AutomationError),
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            LoginOutcome::Authenticated => Ok(()),
            LoginOutcome::Failed(cause) => Err(cause),
        }
    }
}

pub struct LoginCoordinator {
    driver: Arc<dyn AutomationDriver>,
    credentials: Arc<dyn CredentialStore>,
    secrets: Arc<dyn SecretResolver>,
    playbook: Arc<SitePlaybook>,
    timings: AutomationTimings,
}

impl LoginCoordinator {
    pub fn new(
        driver: Arc<dyn AutomationDriver>,
        credentials: Arc<dyn CredentialStore>,
        secrets: Arc<dyn SecretResolver>,
        playbook: Arc<SitePlaybook>,
        timings: AutomationTimings,
    ) -> Self {
        Self {
            driver,
            credentials,
            secrets,
            playbook,
            timings,
        }
    }

    /// Makes sure `session` is signed in as `user_id`.
    pub async fn ensure_logged_in(&self, session: &SessionHandle, user_id: &str) -> LoginOutcome {
        let mut state = LoginState::Unknown;

        match self.run(session, user_id, &mut state).await {
            Ok(()) => LoginOutcome::Authenticated,
            Err(cause) => {
                warn!(
                    "Login for user {} failed in state {:?}: {}",
                    user_id, state, cause
                );
                LoginOutcome::Failed(cause)
            }
        }
    }

    async fn run(
        &self,
        session: &SessionHandle,
        user_id: &str,
        state: &mut LoginState,
    ) -> Result<()> {
        *state = LoginState::Checking;
        *state = self.check(session).await?;

        if *state == LoginState::Authenticated {
            info!("Session for user {} is already authenticated", user_id);
            return Ok(());
        }

        info!("Session for user {} is not authenticated, signing in", user_id);
        *state = LoginState::Error;
        self.enter_credentials(session, user_id).await?;

        match self.settle_location(session).await? {
            Location::Account => {
                *state = LoginState::Authenticated;
                info!("User {} signed in", user_id);
                Ok(())
            }
            other => {
                let url = self.location(session).await?;
                Err(AutomationError::Login(format!(
                    "post-login location unresolved ({:?} at {})",
                    other, url
                )))
            }
        }
    }

    /// Opens the protected page and classifies where the session ends up.
    async fn check(&self, session: &SessionHandle) -> Result<LoginState> {
        self.goto(session, &self.playbook.account_url).await?;

        let mut location = self.classify(session).await?;
        if location == Location::Ambiguous {
            debug!("Login state ambiguous, re-checking once");
            tokio::time::sleep(self.timings.recheck_delay).await;
            location = self.classify(session).await?;
        }

        Ok(match location {
            Location::Account => LoginState::Authenticated,
            Location::SignIn | Location::Ambiguous => LoginState::Unauthenticated,
        })
    }

    /// Classifies after a login attempt, giving a slow or blank page one more chance.
    async fn settle_location(&self, session: &SessionHandle) -> Result<Location> {
        let location = self.classify(session).await?;

        match location {
            Location::Account => Ok(location),
            Location::Ambiguous => {
                debug!("Blank page after login, reloading the account page");
                self.goto(session, &self.playbook.account_url).await?;
                self.classify(session).await
            }
            Location::SignIn => {
                debug!("Still on the sign-in page, waiting before re-checking");
                tokio::time::sleep(self.timings.recheck_delay).await;
                self.classify(session).await
            }
        }
    }

    async fn enter_credentials(&self, session: &SessionHandle, user_id: &str) -> Result<()> {
        let record = self.credentials.get(user_id).await?.ok_or_else(|| {
            AutomationError::Credential(format!("no credentials registered for user {}", user_id))
        })?;

        let secret = self
            .secrets
            .resolve(&record.secret_ref)
            .await
            .map_err(|e| AutomationError::Credential(e.to_string()))?;

        let locators = &self.playbook.locators;

        let email_field = self.require(session, &locators.email_field).await?;
        self.type_like_a_person(&email_field, &record.email).await?;
        tokio::time::sleep(self.timings.action_pause).await;
        self.click(session, &locators.email_next).await?;
        tokio::time::sleep(self.timings.page_settle).await;

        let password_field = self.require(session, &locators.password_field).await?;
        self.type_like_a_person(&password_field, secret.expose())
            .await?;
        tokio::time::sleep(self.timings.action_pause).await;
        self.click(session, &locators.password_next).await?;
        tokio::time::sleep(self.timings.page_settle).await;

        Ok(())
    }

    async fn require(&self, session: &SessionHandle, target: &ElementLocator) -> Result<Element> {
        self.driver
            .locate(session, target)
            .await
            .map_err(|e| AutomationError::Login(format!("locating {}: {}", target.name, e)))?
            .ok_or_else(|| AutomationError::Login(format!("{} not found", target.name)))
    }

    async fn click(&self, session: &SessionHandle, target: &ElementLocator) -> Result<()> {
        let element = self.require(session, target).await?;
        self.driver
            .click(&element)
            .await
            .map_err(|e| AutomationError::Login(format!("clicking {}: {}", target.name, e)))
    }

    /// Types one character at a time with a random pause between keys.
    async fn type_like_a_person(&self, element: &Element, text: &str) -> Result<()> {
        self.driver
            .click(element)
            .await
            .map_err(|e| AutomationError::Login(format!("focusing input: {}", e)))?;

        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.driver
                .type_text(element, ch.encode_utf8(&mut buf))
                .await
                .map_err(|e| AutomationError::Login(format!("typing: {}", e)))?;
            tokio::time::sleep(self.keystroke_delay()).await;
        }

        Ok(())
    }

    fn keystroke_delay(&self) -> Duration {
        let min = self.timings.typing_delay_min;
        let max = self.timings.typing_delay_max;
        if max <= min {
            return min;
        }
        rand::rng().random_range(min..=max)
    }

    async fn goto(&self, session: &SessionHandle, url: &str) -> Result<()> {
        self.driver
            .navigate(session, url)
            .await
            .map_err(|e| AutomationError::Login(format!("navigating to {}: {}", url, e)))?;
        tokio::time::sleep(self.timings.page_settle).await;
        Ok(())
    }

    async fn location(&self, session: &SessionHandle) -> Result<String> {
        self.driver
            .current_location(session)
            .await
            .map_err(|e| AutomationError::Login(format!("reading location: {}", e)))
    }

    async fn classify(&self, session: &SessionHandle) -> Result<Location> {
        let url = self.location(session).await?;
        Ok(self.playbook.classify(&url))
    }
}
