//! User-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use relay_core::dto::user::{CredentialSummary, SetCredentials, UserStats};

impl OrchestratorClient {
    /// Job counts and credit status for a user
    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let url = self.url(&format!("/users/{}/stats", user_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Register or update the account a user's jobs sign in with
    pub async fn set_credentials(
        &self,
        user_id: &str,
        req: &SetCredentials,
    ) -> Result<CredentialSummary> {
        let url = self.url(&format!("/users/{}/credentials", user_id));
        let response = self.client.put(&url).json(req).send().await?;

        self.handle_response(response).await
    }
}
