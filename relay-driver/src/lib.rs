//! Relay Automation Driver
//!
//! The browser automation capability used by the orchestrator. The rest of
//! the system only sees the [`AutomationDriver`] trait: start an isolated
//! session on a profile directory, navigate, find elements, type, click,
//! evaluate script, read attributes, stop.
//!
//! [`WebDriverClient`] implements the trait against any W3C WebDriver
//! endpoint (chromedriver, selenium grid, ...).
//!
//! # Example
//!
//! ```no_run
//! use relay_driver::{AutomationDriver, Locator, WebDriverClient};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> relay_driver::Result<()> {
//!     let driver = WebDriverClient::new("http://localhost:4444");
//!     let session = driver.start_session(Path::new("./profiles/U1")).await?;
//!
//!     driver.navigate(&session, "https://example.com").await?;
//!     let heading = driver.find(&session, &Locator::css("h1")).await?;
//!     println!("found heading: {}", heading.is_some());
//!
//!     driver.stop(session).await
//! }
//! ```

pub mod error;
pub mod locator;
mod webdriver;

pub use error::{DriverError, Result};
pub use locator::{ElementLocator, Locator};
pub use webdriver::WebDriverClient;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// An open browser session.
///
/// Not `Clone`: [`AutomationDriver::stop`] consumes the handle so a stopped
/// session cannot be used again.
#[derive(Debug, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: String,
    /// Profile directory the session was started on
    pub profile: PathBuf,
}

/// Reference to an element inside a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub session_id: String,
    pub id: String,
}

/// Browser automation capability
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Starts a session whose browser state lives in `profile`.
    async fn start_session(&self, profile: &Path) -> Result<SessionHandle>;

    async fn navigate(&self, session: &SessionHandle, url: &str) -> Result<()>;

    /// Current URL of the session's top-level page
    async fn current_location(&self, session: &SessionHandle) -> Result<String>;

    /// Finds the first element matching `locator`, `None` if nothing matches.
    async fn find(&self, session: &SessionHandle, locator: &Locator) -> Result<Option<Element>>;

    /// Tries each strategy of `target` in order.
    ///
    /// A strategy that errors is treated as a miss. The last error is only
    /// returned if every strategy errored.
    async fn locate(
        &self,
        session: &SessionHandle,
        target: &ElementLocator,
    ) -> Result<Option<Element>> {
        let mut last_error = None;
        let mut any_miss = false;

        for strategy in &target.strategies {
            match self.find(session, strategy).await {
                Ok(Some(element)) => {
                    tracing::debug!("Located '{}' via {:?}", target.name, strategy);
                    return Ok(Some(element));
                }
                Ok(None) => any_miss = true,
                Err(e) => {
                    tracing::debug!(
                        "Strategy {:?} for '{}' failed: {}",
                        strategy,
                        target.name,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_miss => Err(e),
            _ => Ok(None),
        }
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<()>;

    async fn click(&self, element: &Element) -> Result<()>;

    async fn read_attribute(&self, element: &Element, name: &str) -> Result<Option<String>>;

    /// Runs `script` in the page and returns its JSON result.
    async fn evaluate(&self, session: &SessionHandle, script: &str) -> Result<serde_json::Value>;

    /// Ends the session and releases the browser.
    async fn stop(&self, session: SessionHandle) -> Result<()>;
}
