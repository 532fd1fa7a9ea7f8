//! Relay HTTP Client
//!
//! A type-safe HTTP client for the Relay orchestrator API, shared by the CLI
//! and by services that submit automation jobs.
//!
//! # Example
//!
//! ```no_run
//! use relay_client::OrchestratorClient;
//! use relay_core::dto::job::SubmitJob;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = OrchestratorClient::new("http://localhost:8080");
//!
//!     let accepted = client.submit_job("google-flow", &SubmitJob {
//!         job_id: Some("J1".to_string()),
//!         prompt: Some("dog running in a park".to_string()),
//!         model: Some("video".to_string()),
//!         timestamp: Some("2025-08-27T18:15:00Z".to_string()),
//!         user_id: Some("U1".to_string()),
//!         action: Some("create_project".to_string()),
//!         timeout: Some(300),
//!         callback_url: Some("https://caller.example.com/cb".to_string()),
//!     }).await?;
//!
//!     println!("Accepted job: {}", accepted.job_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod system;
mod users;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Relay orchestrator API
///
/// Methods are grouped by concern:
/// - Jobs (submit, status, active sessions)
/// - Users (statistics, credentials)
/// - System (health, affinities, history cleanup)
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client with a configured reqwest `Client` (timeouts, proxies, TLS).
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code, then deserialize the JSON body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
