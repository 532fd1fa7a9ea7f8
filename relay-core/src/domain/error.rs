//! Failure taxonomy shared by job history and callbacks

use serde::{Deserialize, Serialize};

/// Category of a job failure.
///
/// Threaded through to the failure callback (`errorKind`) and the job history
/// row so callers can react to a class of failure instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed request field
    Validation,
    /// Automation driver could not start a session
    Session,
    /// Credential login failed or its outcome could not be resolved
    Login,
    /// Workspace could not be reached or created
    Navigation,
    /// Prompt input or generation trigger missing
    Generation,
    /// Artifact fetch failed
    Download,
    /// Callback could not be delivered
    CallbackDelivery,
    /// The job exceeded its deadline
    Timeout,
    /// State store read or write failed
    Store,
    /// Credentials missing or secret reference unresolvable
    Credential,
    /// The worker running the job aborted
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Session => "session",
            ErrorKind::Login => "login",
            ErrorKind::Navigation => "navigation",
            ErrorKind::Generation => "generation",
            ErrorKind::Download => "download",
            ErrorKind::CallbackDelivery => "callback_delivery",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Store => "store",
            ErrorKind::Credential => "credential",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(ErrorKind::Validation),
            "session" => Ok(ErrorKind::Session),
            "login" => Ok(ErrorKind::Login),
            "navigation" => Ok(ErrorKind::Navigation),
            "generation" => Ok(ErrorKind::Generation),
            "download" => Ok(ErrorKind::Download),
            "callback_delivery" => Ok(ErrorKind::CallbackDelivery),
            "timeout" => Ok(ErrorKind::Timeout),
            "store" => Ok(ErrorKind::Store),
            "credential" => Ok(ErrorKind::Credential),
            "internal" => Ok(ErrorKind::Internal),
            other => Err(format!("unknown error kind: {}", other)),
        }
    }
}
