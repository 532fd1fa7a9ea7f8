//! Job-step error taxonomy
//!
//! Every failure inside a job is one of these. The worker collapses it into
//! a message plus an [`ErrorKind`] tag for the callback and history row.

use relay_core::domain::error::ErrorKind;
use std::time::Duration;
use thiserror::Error;

use crate::repository::StoreError;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("{0}")]
    Validation(String),

    /// The driver could not start a session
    #[error("session error: {0}")]
    Session(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("callback delivery failed: {0}")]
    CallbackDelivery(String),

    #[error("job deadline of {}s exceeded", .0.as_secs())]
    Timeout(Duration),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Missing credential record or unresolvable secret
    #[error("credential error: {0}")]
    Credential(String),
}

impl AutomationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AutomationError::Validation(_) => ErrorKind::Validation,
            AutomationError::Session(_) => ErrorKind::Session,
            AutomationError::Login(_) => ErrorKind::Login,
            AutomationError::Navigation(_) => ErrorKind::Navigation,
            AutomationError::Generation(_) => ErrorKind::Generation,
            AutomationError::Download(_) => ErrorKind::Download,
            AutomationError::CallbackDelivery(_) => ErrorKind::CallbackDelivery,
            AutomationError::Timeout(_) => ErrorKind::Timeout,
            AutomationError::Store(_) => ErrorKind::Store,
            AutomationError::Credential(_) => ErrorKind::Credential,
        }
    }

    /// Whether the step that produced this error may be attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutomationError::Session(_) | AutomationError::Login(_) | AutomationError::Navigation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AutomationError>;
