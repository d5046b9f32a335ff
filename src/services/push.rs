//! Push delivery seam.
//!
//! The dispatcher only needs `send(subscription, payload) -> ok | failure`
//! with enough status detail to recognize a gone endpoint. `WebPushProvider`
//! is the process-wide implementation; tests inject their own transport.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::PushConfig;
use crate::store::operations::subscriptions::PushSubscription;

#[derive(Debug, Error)]
pub enum PushError {
    /// 404/410: the endpoint no longer exists and should be cleaned up.
    #[error("push endpoint gone: status={status}")]
    Gone { status: u16 },
    #[error("push delivery failed: status={status}, message={message}")]
    Delivery { status: u16, message: String },
    #[error("push network error: {0}")]
    Network(String),
    #[error("push transport disabled")]
    Disabled,
}

impl PushError {
    pub fn from_status(status: u16, message: String) -> Self {
        if status == 404 || status == 410 {
            PushError::Gone { status }
        } else {
            PushError::Delivery { status, message }
        }
    }
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &str)
        -> Result<(), PushError>;
}

#[derive(Debug, Clone)]
pub struct WebPushProvider {
    config: PushConfig,
    #[allow(dead_code)]
    client: reqwest::Client,
}

impl WebPushProvider {
    pub fn new(config: &PushConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Validate push configuration at startup. Panics if `enabled=true` and
    /// `mock=false`, since VAPID signing and payload encryption live in an
    /// external delivery service that is not wired in yet.
    pub fn validate_config(config: &PushConfig) {
        if config.enabled && !config.mock {
            panic!(
                "Invalid push configuration: enabled=true and mock=false, \
                 but real web-push delivery is not wired in. \
                 Set PUSH_MOCK=true or PUSH_ENABLED=false."
            );
        }
        if config.enabled && (config.public_key.is_empty() || config.private_key.is_empty()) {
            panic!(
                "Invalid push configuration: enabled=true requires \
                 WEB_PUSH_PUBLIC_KEY and WEB_PUSH_PRIVATE_KEY."
            );
        }
    }
}

#[async_trait]
impl PushTransport for WebPushProvider {
    async fn send(
        &self,
        _subscription: &PushSubscription,
        _payload: &str,
    ) -> Result<(), PushError> {
        if !self.config.enabled {
            return Err(PushError::Disabled);
        }
        if self.config.mock {
            return Ok(());
        }

        Err(PushError::Delivery {
            status: 501,
            message: "real web-push delivery is not wired in".to_string(),
        })
    }
}
