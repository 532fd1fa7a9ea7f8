//! Error types for the automation driver

use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors raised while talking to a browser automation backend
#[derive(Debug, Error)]
pub enum DriverError {
    /// The HTTP request to the backend failed
    #[error("WebDriver request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a protocol-level error
    #[error("WebDriver error (status {status}, {error}): {message}")]
    Protocol {
        status: u16,
        error: String,
        message: String,
    },

    /// The backend answered with a body we could not interpret
    #[error("Unexpected WebDriver response: {0}")]
    UnexpectedResponse(String),

    /// No session could be created
    #[error("Session not created: {0}")]
    SessionNotCreated(String),
}

impl DriverError {
    pub fn protocol(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    /// W3C "no such element" error
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, Self::Protocol { error, .. } if error == "no such element")
    }
}
