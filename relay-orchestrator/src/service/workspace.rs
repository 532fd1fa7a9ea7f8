//! Workspace Affinity Manager
//!
//! Keeps each user on one reusable workspace. A stored mapping is validated
//! by navigating to it; an unreachable workspace is replaced by a new one.
//! The replacement goes through [`StateStore::replace_affinity`], so a
//! mapping changed by someone else in the meantime is never overwritten.

use relay_driver::{AutomationDriver, SessionHandle};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AutomationTimings;
use crate::repository::{CredentialStore, StateStore};
use crate::service::error::{AutomationError, Result};
use crate::service::playbook::SitePlaybook;

pub struct WorkspaceManager {
    driver: Arc<dyn AutomationDriver>,
    store: Arc<dyn StateStore>,
    credentials: Arc<dyn CredentialStore>,
    playbook: Arc<SitePlaybook>,
    timings: AutomationTimings,
}

impl WorkspaceManager {
    pub fn new(
        driver: Arc<dyn AutomationDriver>,
        store: Arc<dyn StateStore>,
        credentials: Arc<dyn CredentialStore>,
        playbook: Arc<SitePlaybook>,
        timings: AutomationTimings,
    ) -> Self {
        Self {
            driver,
            store,
            credentials,
            playbook,
            timings,
        }
    }

    /// Returns a reachable workspace for `user_id`, creating one if needed.
    ///
    /// Leaves the session on the workspace page.
    pub async fn get_or_create(&self, session: &SessionHandle, user_id: &str) -> Result<String> {
        let current = self.store.get_affinity(user_id).await?;

        if let Some(workspace_id) = &current {
            if self.open(session, workspace_id).await? {
                info!("Reusing workspace {} for user {}", workspace_id, user_id);
                return Ok(workspace_id.clone());
            }
            warn!(
                "Workspace {} for user {} is unreachable, creating a replacement",
                workspace_id, user_id
            );
        }

        let created = self.create(session, user_id).await?;

        if self
            .store
            .replace_affinity(user_id, current.as_deref(), &created)
            .await?
        {
            info!("Mapped user {} to workspace {}", user_id, created);
            return Ok(created);
        }

        // Another writer got there first; prefer its mapping if it works.
        let winner = self.store.get_affinity(user_id).await?;
        warn!(
            "Affinity for user {} changed concurrently (now {:?}), discarding {}",
            user_id, winner, created
        );
        match winner {
            Some(workspace_id) if self.open(session, &workspace_id).await? => Ok(workspace_id),
            _ => Err(AutomationError::Navigation(format!(
                "affinity for user {} changed concurrently and is not reachable",
                user_id
            ))),
        }
    }

    /// Navigates to a workspace and reports whether the page confirms it.
    async fn open(&self, session: &SessionHandle, workspace_id: &str) -> Result<bool> {
        let url = self.playbook.workspace_url(workspace_id);
        self.driver
            .navigate(session, &url)
            .await
            .map_err(|e| AutomationError::Navigation(format!("opening {}: {}", url, e)))?;
        tokio::time::sleep(self.timings.page_settle).await;

        let landed = self
            .driver
            .current_location(session)
            .await
            .map_err(|e| AutomationError::Navigation(format!("reading location: {}", e)))?;

        let confirmed = self.playbook.confirms_workspace(&landed, workspace_id);
        if !confirmed {
            debug!("Expected workspace {}, landed on {}", workspace_id, landed);
        }
        Ok(confirmed)
    }

    async fn create(&self, session: &SessionHandle, user_id: &str) -> Result<String> {
        self.driver
            .navigate(session, &self.playbook.home_url)
            .await
            .map_err(|e| AutomationError::Navigation(format!("opening home page: {}", e)))?;
        tokio::time::sleep(self.timings.page_settle).await;

        // Users without a record have never been through onboarding either
        let first_login = self
            .credentials
            .get(user_id)
            .await?
            .is_none_or(|record| record.is_first_login);

        if first_login {
            self.dismiss_onboarding(session).await;
        }

        let control = self
            .driver
            .locate(session, &self.playbook.locators.new_workspace)
            .await
            .map_err(|e| AutomationError::Navigation(format!("locating new workspace control: {}", e)))?
            .ok_or_else(|| {
                AutomationError::Navigation("new workspace control not found".to_string())
            })?;

        self.driver
            .click(&control)
            .await
            .map_err(|e| AutomationError::Navigation(format!("creating workspace: {}", e)))?;
        tokio::time::sleep(self.timings.page_settle).await;

        let landed = self
            .driver
            .current_location(session)
            .await
            .map_err(|e| AutomationError::Navigation(format!("reading location: {}", e)))?;

        let workspace_id = self.playbook.parse_workspace_id(&landed).ok_or_else(|| {
            AutomationError::Navigation(format!("no workspace id in {}", landed))
        })?;

        info!("Created workspace {} for user {}", workspace_id, user_id);

        if first_login {
            self.credentials.mark_onboarding_done(user_id).await?;
        }

        Ok(workspace_id)
    }

    /// Clicks through the first-run flow if it is showing. Its absence is normal.
    async fn dismiss_onboarding(&self, session: &SessionHandle) {
        match self
            .driver
            .locate(session, &self.playbook.locators.onboarding)
            .await
        {
            Ok(Some(button)) => {
                if let Err(e) = self.driver.click(&button).await {
                    warn!("Failed to dismiss onboarding: {}", e);
                    return;
                }
                info!("Dismissed onboarding");
                tokio::time::sleep(self.timings.action_pause).await;
            }
            Ok(None) => debug!("No onboarding shown"),
            Err(e) => debug!("Onboarding check failed: {}", e),
        }
    }
}
