//! Site playbook
//!
//! Everything that ties the orchestrator to one particular web application:
//! URLs, URL markers and element locators. The coordination code only asks
//! the playbook questions ("is this a sign-in page?", "where is the email
//! field?") and never references markup itself.
//!
//! A JSON file (`PLAYBOOK_PATH`) may override any field.

use anyhow::Context;
use relay_driver::{ElementLocator, Locator};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a session currently is, as far as login is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    SignIn,
    Account,
    /// Blank, crashed or unrecognized page
    Ambiguous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitePlaybook {
    /// Protected page whose landing location reveals the login state
    pub account_url: String,
    /// URL fragments that identify a sign-in page
    pub sign_in_markers: Vec<String>,
    /// URL fragments that identify the protected page
    pub account_markers: Vec<String>,
    /// Landing page with the "new workspace" control
    pub home_url: String,
    /// Workspace URL is this prefix followed by the workspace id
    pub workspace_url_prefix: String,
    /// Path segment that precedes the id in a workspace URL
    pub workspace_id_marker: String,
    /// Evaluated once per session, right after it starts
    pub stealth_script: String,
    pub locators: PlaybookLocators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybookLocators {
    pub email_field: ElementLocator,
    pub email_next: ElementLocator,
    pub password_field: ElementLocator,
    pub password_next: ElementLocator,
    pub onboarding: ElementLocator,
    pub new_workspace: ElementLocator,
    pub prompt_input: ElementLocator,
    pub generate_button: ElementLocator,
    pub credit_notice: ElementLocator,
    pub artifact: ElementLocator,
}

impl SitePlaybook {
    /// Built-in playbook, overridden by the JSON file at `path` if given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read playbook {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse playbook {}", path.display()))
    }

    pub fn classify(&self, url: &str) -> Location {
        let url = url.trim();
        if url.is_empty() || url == "about:blank" || url.starts_with("data:") {
            return Location::Ambiguous;
        }
        if self.sign_in_markers.iter().any(|m| url.contains(m.as_str())) {
            return Location::SignIn;
        }
        if self.account_markers.iter().any(|m| url.contains(m.as_str())) {
            return Location::Account;
        }
        Location::Ambiguous
    }

    pub fn workspace_url(&self, workspace_id: &str) -> String {
        format!("{}{}", self.workspace_url_prefix, workspace_id)
    }

    /// Extracts the workspace id from a post-creation URL.
    pub fn parse_workspace_id(&self, url: &str) -> Option<String> {
        let (_, rest) = url.split_once(self.workspace_id_marker.as_str())?;
        let id = rest
            .split(['?', '#', '/'])
            .next()
            .unwrap_or_default()
            .trim();

        (!id.is_empty()).then(|| id.to_string())
    }

    /// Whether `url` shows the given workspace
    pub fn confirms_workspace(&self, url: &str, workspace_id: &str) -> bool {
        self.parse_workspace_id(url).as_deref() == Some(workspace_id)
    }
}

impl Default for SitePlaybook {
    fn default() -> Self {
        Self {
            account_url: "https://myaccount.example.com/".to_string(),
            sign_in_markers: vec!["accounts.example.com".to_string(), "/signin".to_string()],
            account_markers: vec!["myaccount.example.com".to_string()],
            home_url: "https://studio.example.com/tools/flow".to_string(),
            workspace_url_prefix: "https://studio.example.com/tools/flow/project/".to_string(),
            workspace_id_marker: "/project/".to_string(),
            stealth_script: "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });"
                .to_string(),
            locators: PlaybookLocators::default(),
        }
    }
}

impl Default for PlaybookLocators {
    fn default() -> Self {
        Self {
            email_field: ElementLocator::new(
                "email_field",
                vec![
                    Locator::css("input[name='identifier']"),
                    Locator::css("input[type='email']"),
                    Locator::css("#identifierId"),
                    Locator::css("input[autocomplete='username']"),
                ],
            ),
            email_next: ElementLocator::new(
                "email_next",
                vec![
                    Locator::css("#identifierNext button"),
                    Locator::css("#identifierNext"),
                    Locator::button_text("Next"),
                    Locator::button_text("Siguiente"),
                ],
            ),
            password_field: ElementLocator::new(
                "password_field",
                vec![
                    Locator::css("input[name='Passwd']"),
                    Locator::css("input[type='password']"),
                    Locator::css("input[autocomplete='current-password']"),
                ],
            ),
            password_next: ElementLocator::new(
                "password_next",
                vec![
                    Locator::css("#passwordNext button"),
                    Locator::css("#passwordNext"),
                    Locator::button_text("Next"),
                    Locator::button_text("Siguiente"),
                ],
            ),
            onboarding: ElementLocator::new(
                "onboarding",
                vec![
                    Locator::button_text("Get started"),
                    Locator::button_text("Comenzar"),
                    Locator::button_text("Got it"),
                ],
            ),
            new_workspace: ElementLocator::new(
                "new_workspace",
                vec![
                    Locator::button_text("New project"),
                    Locator::button_text("Nuevo proyecto"),
                    Locator::css("[data-testid='new-project']"),
                ],
            ),
            prompt_input: ElementLocator::new(
                "prompt_input",
                vec![
                    Locator::css("textarea#PINHOLE_TEXT_AREA_ELEMENT_ID"),
                    Locator::css("textarea"),
                    Locator::css("[contenteditable='true']"),
                ],
            ),
            generate_button: ElementLocator::new(
                "generate_button",
                vec![
                    Locator::css("button[aria-label='Create']"),
                    Locator::xpath("//button[.//i[normalize-space(.)='arrow_forward']]"),
                    Locator::button_text("Create"),
                    Locator::button_text("Crear"),
                ],
            ),
            credit_notice: ElementLocator::new(
                "credit_notice",
                vec![
                    Locator::xpath("//*[contains(., 'enough credits')][not(*[contains(., 'enough credits')])]"),
                    Locator::xpath("//*[contains(., 'suficientes créditos')][not(*[contains(., 'suficientes créditos')])]"),
                ],
            ),
            artifact: ElementLocator::new(
                "artifact",
                vec![
                    Locator::css("div[data-index='1'] video"),
                    Locator::css("video[src]"),
                ],
            ),
        }
    }
}
