use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use espanhol_backend::services::push::{PushError, PushTransport};
use espanhol_backend::store::operations::subscriptions::PushSubscription;

/// Test transport: records every delivery and can be told to fail specific
/// endpoints with a given HTTP status.
#[derive(Debug, Default)]
pub struct RecordingPush {
    sent: Mutex<Vec<(String, String)>>,
    failures: Mutex<HashMap<String, u16>>,
}

impl RecordingPush {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_endpoint(&self, endpoint: &str, status: u16) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(endpoint.to_string(), status);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sent lock").len()
    }
}

#[async_trait]
impl PushTransport for RecordingPush {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &str,
    ) -> Result<(), PushError> {
        let status = self
            .failures
            .lock()
            .expect("failures lock")
            .get(&subscription.endpoint)
            .copied();
        if let Some(status) = status {
            return Err(PushError::from_status(status, "forced failure".to_string()));
        }
        self.sent
            .lock()
            .expect("sent lock")
            .push((subscription.endpoint.clone(), payload.to_string()));
        Ok(())
    }
}
