//! User DTOs

use serde::{Deserialize, Serialize};

use crate::domain::credential::{CreditStatus, SecretRef};

/// Per-user job statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub no_artifact_jobs: i64,
    pub failed_jobs: i64,
    pub credit_status: Option<CreditStatus>,
}

/// Body of `PUT /users/{userId}/credentials`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCredentials {
    pub email: String,
    pub secret_ref: SecretRef,
}

/// Credential record as returned by the API (no secret material)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub user_id: String,
    pub email: String,
    pub credit_status: CreditStatus,
    pub is_first_login: bool,
}
