//! Generation step
//!
//! Enters the prompt in the open workspace and presses the trigger. A
//! disabled trigger or a visible credit notice is an expected business
//! condition, reported as an outcome rather than an error.

use relay_driver::{AutomationDriver, Element, SessionHandle};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AutomationTimings;
use crate::service::error::{AutomationError, Result};
use crate::service::playbook::SitePlaybook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Started,
    /// The trigger was present but disabled (usually no credits left)
    TriggerDisabled,
    /// The site reported insufficient credits after the trigger
    CreditNotice,
}

pub struct GenerationStep {
    driver: Arc<dyn AutomationDriver>,
    playbook: Arc<SitePlaybook>,
    timings: AutomationTimings,
}

impl GenerationStep {
    pub fn new(
        driver: Arc<dyn AutomationDriver>,
        playbook: Arc<SitePlaybook>,
        timings: AutomationTimings,
    ) -> Self {
        Self {
            driver,
            playbook,
            timings,
        }
    }

    pub async fn run(&self, session: &SessionHandle, prompt: &str) -> Result<GenerationOutcome> {
        let locators = &self.playbook.locators;

        let input = self
            .driver
            .locate(session, &locators.prompt_input)
            .await
            .map_err(|e| AutomationError::Generation(format!("locating prompt input: {}", e)))?
            .ok_or_else(|| AutomationError::Generation("prompt input not found".to_string()))?;

        self.driver
            .click(&input)
            .await
            .map_err(|e| AutomationError::Generation(format!("focusing prompt input: {}", e)))?;
        self.driver
            .type_text(&input, prompt)
            .await
            .map_err(|e| AutomationError::Generation(format!("entering prompt: {}", e)))?;
        tokio::time::sleep(self.timings.action_pause).await;

        let trigger = self
            .driver
            .locate(session, &locators.generate_button)
            .await
            .map_err(|e| AutomationError::Generation(format!("locating trigger: {}", e)))?
            .ok_or_else(|| AutomationError::Generation("generate control not found".to_string()))?;

        if self.is_disabled(&trigger).await {
            info!("Generate control is disabled, treating as no-credit condition");
            return Ok(GenerationOutcome::TriggerDisabled);
        }

        self.driver
            .click(&trigger)
            .await
            .map_err(|e| AutomationError::Generation(format!("pressing trigger: {}", e)))?;
        tokio::time::sleep(self.timings.action_pause).await;

        match self.driver.locate(session, &locators.credit_notice).await {
            Ok(Some(_)) => {
                info!("Credit notice shown after trigger");
                return Ok(GenerationOutcome::CreditNotice);
            }
            Ok(None) => {}
            Err(e) => debug!("Credit notice check failed: {}", e),
        }

        info!("Generation started");
        Ok(GenerationOutcome::Started)
    }

    async fn is_disabled(&self, element: &Element) -> bool {
        let disabled = self
            .attribute(element, "disabled")
            .await
            .is_some_and(|v| v != "false");
        let aria_disabled = self
            .attribute(element, "aria-disabled")
            .await
            .is_some_and(|v| v == "true");
        disabled || aria_disabled
    }

    async fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        self.driver
            .read_attribute(element, name)
            .await
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::FakeDriver;
    use std::path::Path;

    async fn on_workspace(driver: &FakeDriver) -> SessionHandle {
        let session = driver.start_session(Path::new("/tmp/U1")).await.unwrap();
        driver.with(|s| {
            s.workspaces.insert("ws-1".to_string());
        });
        let url = driver.playbook.workspace_url("ws-1");
        driver.navigate(&session, &url).await.unwrap();
        session
    }

    fn step(driver: Arc<FakeDriver>) -> GenerationStep {
        GenerationStep::new(
            driver,
            Arc::new(SitePlaybook::default()),
            AutomationTimings::immediate(),
        )
    }

    #[tokio::test]
    async fn test_enters_prompt_and_triggers() {
        let driver = Arc::new(FakeDriver::new());
        let session = on_workspace(&driver).await;

        let outcome = step(driver.clone())
            .run(&session, "dog running in a park")
            .await
            .unwrap();

        assert_eq!(outcome, GenerationOutcome::Started);
        assert!(driver.with(|s| s.generation_started));
        assert!(driver.with(|s| s
            .typed
            .contains(&("prompt_input".to_string(), "dog running in a park".to_string()))));
    }

    #[tokio::test]
    async fn test_disabled_trigger_is_soft_outcome() {
        let driver = Arc::new(FakeDriver::new());
        driver.with(|s| s.trigger_disabled = true);
        let session = on_workspace(&driver).await;

        let outcome = step(driver.clone()).run(&session, "cat").await.unwrap();

        assert_eq!(outcome, GenerationOutcome::TriggerDisabled);
        assert!(!driver.with(|s| s.generation_started));
    }

    #[tokio::test]
    async fn test_credit_notice_is_soft_outcome() {
        let driver = Arc::new(FakeDriver::new());
        driver.with(|s| s.credit_notice = true);
        let session = on_workspace(&driver).await;

        let outcome = step(driver).run(&session, "cat").await.unwrap();

        assert_eq!(outcome, GenerationOutcome::CreditNotice);
    }

    #[tokio::test]
    async fn test_missing_prompt_input_is_an_error() {
        let driver = Arc::new(FakeDriver::new());
        let session = driver.start_session(Path::new("/tmp/U1")).await.unwrap();

        let err = step(driver).run(&session, "cat").await.unwrap_err();

        assert!(matches!(err, AutomationError::Generation(ref m) if m == "prompt input not found"));
    }
}
