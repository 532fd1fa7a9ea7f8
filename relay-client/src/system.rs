//! Service-level API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use relay_core::domain::affinity::WorkspaceAffinity;
use relay_core::dto::system::{CleanupResult, HealthStatus};

impl OrchestratorClient {
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.url("/health")).send().await?;

        self.handle_response(response).await
    }

    /// All user to workspace mappings
    pub async fn list_affinities(&self) -> Result<Vec<WorkspaceAffinity>> {
        let response = self.client.get(self.url("/affinities")).send().await?;

        self.handle_response(response).await
    }

    /// Delete finished history rows older than `days`, or the server's
    /// retention default when `None`.
    pub async fn cleanup_history(&self, days: Option<u32>) -> Result<CleanupResult> {
        let mut request = self.client.post(self.url("/history/cleanup"));
        if let Some(days) = days {
            request = request.query(&[("days", days)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }
}
