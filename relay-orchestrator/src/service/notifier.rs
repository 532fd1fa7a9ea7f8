//! Callback Notifier
//!
//! One POST per lifecycle transition. A request is only repeated when it
//! never reached the peer (connection refused, DNS failure), so a transition
//! is delivered at most once. Timeouts and non-2xx answers are final.

use async_trait::async_trait;
use relay_core::domain::callback::CallbackPayload;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::service::error::{AutomationError, Result};
use crate::service::retry::{RetryPolicy, with_backoff};

#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify(&self, url: &str, payload: &CallbackPayload) -> Result<()>;
}

/// Delivers callbacks over HTTP
#[derive(Debug, Clone)]
pub struct HttpCallbackNotifier {
    client: reqwest::Client,
    policy: RetryPolicy,
}

/// Outcome of a single delivery attempt
enum DeliveryFailure {
    /// The request never reached the peer
    NotSent(reqwest::Error),
    /// The peer saw the request (or may have)
    Failed(String),
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::NotSent(e) => write!(f, "connection failed: {}", e),
            DeliveryFailure::Failed(msg) => f.write_str(msg),
        }
    }
}

impl HttpCallbackNotifier {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, policy })
    }

    async fn send_once(
        &self,
        url: &str,
        payload: &CallbackPayload,
    ) -> std::result::Result<(), DeliveryFailure> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    DeliveryFailure::NotSent(e)
                } else if e.is_timeout() {
                    DeliveryFailure::Failed(format!("timed out: {}", e))
                } else {
                    DeliveryFailure::Failed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryFailure::Failed(format!(
                "callback endpoint answered {}",
                status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn notify(&self, url: &str, payload: &CallbackPayload) -> Result<()> {
        with_backoff(
            &self.policy,
            "callback delivery",
            move || self.send_once(url, payload),
            |e| matches!(e, DeliveryFailure::NotSent(_)),
        )
        .await
        .map_err(|e| AutomationError::CallbackDelivery(e.to_string()))?;

        debug!(
            "Callback delivered for job {} ({:?})",
            payload.job_id, payload.status
        );
        Ok(())
    }
}
