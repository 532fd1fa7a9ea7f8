//! Secret resolution
//!
//! Credentials store a [`SecretRef`] such as `env:FLOW_PASSWORD` or
//! `file:/run/secrets/flow`. The secret is resolved right before login and
//! dropped with the login attempt.

use async_trait::async_trait;
use relay_core::domain::credential::SecretRef;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Secret material. Never printed.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("unsupported secret reference scheme in {0:?}")]
    UnsupportedScheme(SecretRef),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("failed to read secret file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secret behind {0:?} is empty")]
    Empty(SecretRef),
}

/// Where a reference points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    Env(String),
    File(PathBuf),
}

impl SecretSource {
    /// Parses `env:NAME` or `file:/path`.
    pub fn parse(reference: &SecretRef) -> Result<Self, SecretError> {
        match reference.as_str().split_once(':') {
            Some(("env", name)) if !name.is_empty() => Ok(SecretSource::Env(name.to_string())),
            Some(("file", path)) if !path.is_empty() => Ok(SecretSource::File(PathBuf::from(path))),
            _ => Err(SecretError::UnsupportedScheme(reference.clone())),
        }
    }
}

#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, reference: &SecretRef) -> Result<Secret, SecretError>;
}

/// Resolves `env:` and `file:` references
#[derive(Debug, Default, Clone)]
pub struct EnvFileSecretResolver;

#[async_trait]
impl SecretResolver for EnvFileSecretResolver {
    async fn resolve(&self, reference: &SecretRef) -> Result<Secret, SecretError> {
        let value = match SecretSource::parse(reference)? {
            SecretSource::Env(name) => {
                std::env::var(&name).map_err(|_| SecretError::MissingEnv(name))?
            }
            SecretSource::File(path) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| SecretError::Io { path, source })?,
        };

        let value = value.trim_end_matches(['\r', '\n']);
        if value.is_empty() {
            return Err(SecretError::Empty(reference.clone()));
        }

        Ok(Secret::new(value))
    }
}
