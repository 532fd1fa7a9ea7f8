//! W3C WebDriver backend

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use std::path::Path;

use crate::error::{DriverError, Result};
use crate::locator::Locator;
use crate::{AutomationDriver, Element, SessionHandle};

/// Key under which W3C endpoints return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// [`AutomationDriver`] backed by a W3C WebDriver endpoint
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    base_url: String,
    client: Client,
    headless: bool,
}

impl WebDriverClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Uses a preconfigured HTTP client (timeouts, proxies, ...).
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            headless: false,
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn browser_args(&self, profile: &Path) -> Vec<String> {
        let mut args = vec![
            format!("--user-data-dir={}", profile.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Unwraps the `value` envelope, turning error payloads into [`DriverError::Protocol`].
    async fn handle_response(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            DriverError::UnexpectedResponse(format!("Failed to parse JSON response: {}", e))
        })?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let error = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(DriverError::protocol(status.as_u16(), error, message));
        }

        Ok(value)
    }
}

#[async_trait]
impl AutomationDriver for WebDriverClient {
    async fn start_session(&self, profile: &Path) -> Result<SessionHandle> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": self.browser_args(profile),
                        "excludeSwitches": ["enable-automation"],
                    }
                }
            }
        });

        let value = self
            .command(Method::POST, "/session", Some(capabilities))
            .await
            .map_err(|e| match e {
                DriverError::Protocol { message, .. } => DriverError::SessionNotCreated(message),
                other => other,
            })?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::UnexpectedResponse("missing sessionId".to_string()))?;

        tracing::debug!("Started WebDriver session {} on {}", id, profile.display());

        Ok(SessionHandle {
            id: id.to_string(),
            profile: profile.to_path_buf(),
        })
    }

    async fn navigate(&self, session: &SessionHandle, url: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/url", session.id),
            Some(json!({ "url": url })),
        )
        .await?;
        Ok(())
    }

    async fn current_location(&self, session: &SessionHandle) -> Result<String> {
        let value = self
            .command(Method::GET, &format!("/session/{}/url", session.id), None)
            .await?;

        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::UnexpectedResponse(format!("URL was not a string: {}", value)))
    }

    async fn find(&self, session: &SessionHandle, locator: &Locator) -> Result<Option<Element>> {
        let (using, value) = locator.to_webdriver();
        let result = self
            .command(
                Method::POST,
                &format!("/session/{}/element", session.id),
                Some(json!({ "using": using, "value": value })),
            )
            .await;

        let value = match result {
            Ok(value) => value,
            Err(e) if e.is_no_such_element() => return Ok(None),
            Err(e) => return Err(e),
        };

        let id = value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::UnexpectedResponse(format!("not an element: {}", value)))?;

        Ok(Some(Element {
            session_id: session.id.clone(),
            id: id.to_string(),
        }))
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/element/{}/value", element.session_id, element.id),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/element/{}/click", element.session_id, element.id),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn read_attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        let value = self
            .command(
                Method::GET,
                &format!(
                    "/session/{}/element/{}/attribute/{}",
                    element.session_id, element.id, name
                ),
                None,
            )
            .await?;

        Ok(value.as_str().map(str::to_string))
    }

    async fn evaluate(&self, session: &SessionHandle, script: &str) -> Result<Value> {
        self.command(
            Method::POST,
            &format!("/session/{}/execute/sync", session.id),
            Some(json!({ "script": script, "args": [] })),
        )
        .await
    }

    async fn stop(&self, session: SessionHandle) -> Result<()> {
        self.command(Method::DELETE, &format!("/session/{}", session.id), None)
            .await?;
        tracing::debug!("Stopped WebDriver session {}", session.id);
        Ok(())
    }
}
