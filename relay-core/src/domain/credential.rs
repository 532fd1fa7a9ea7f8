//! User credential records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account credentials for a user.
///
/// Only a *reference* to the secret is stored (see [`SecretRef`]); the secret
/// itself is resolved at the moment of login and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentialRecord {
    pub user_id: String,
    pub email: String,
    pub secret_ref: SecretRef,
    pub credit_status: CreditStatus,
    /// Cleared after the first successful workspace run
    pub is_first_login: bool,
    pub updated_at: DateTime<Utc>,
}

/// Generation credit state of an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    #[default]
    Active,
    Exhausted,
    Suspended,
}

impl CreditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CreditStatus::Active => "active",
            CreditStatus::Exhausted => "exhausted",
            CreditStatus::Suspended => "suspended",
        }
    }
}

impl std::str::FromStr for CreditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CreditStatus::Active),
            "exhausted" => Ok(CreditStatus::Exhausted),
            "suspended" => Ok(CreditStatus::Suspended),
            other => Err(format!("unknown credit status: {}", other)),
        }
    }
}

/// Opaque handle to a secret, e.g. `env:FLOW_PASSWORD` or `file:/run/secrets/flow`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretRef(String);

impl SecretRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// The reference names where the secret lives, not the secret, but it still
// stays out of logs.
impl std::fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = self.0.split(':').next().unwrap_or_default();
        write!(f, "SecretRef({}:…)", scheme)
    }
}
