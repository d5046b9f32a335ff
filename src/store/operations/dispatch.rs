use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::blocks::ActivityType;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPhase {
    /// Fires five minutes before the block.
    Pre,
    /// Fires at the block's start time.
    Now,
}

impl ReminderPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderPhase::Pre => "pre",
            ReminderPhase::Now => "now",
        }
    }
}

/// Idempotency marker recording that a reminder for one block occurrence and
/// phase was already dispatched. Existence of the key is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDispatch {
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub phase: ReminderPhase,
    #[serde(rename = "type")]
    pub block_type: ActivityType,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Atomically claim a dispatch id. Returns `true` when this caller
    /// created the marker, `false` when it already existed. The
    /// compare-and-swap create closes the race between concurrent duplicate
    /// timer fires.
    pub fn try_claim_dispatch(
        &self,
        user_id: &str,
        dispatch_id: &str,
        marker: &NotificationDispatch,
    ) -> Result<bool, StoreError> {
        let key = keys::dispatch_key(user_id, dispatch_id);
        let bytes = Self::serialize(marker)?;
        let swapped = self.notification_dispatch.compare_and_swap(
            key.as_bytes(),
            None::<&[u8]>,
            Some(bytes),
        )?;
        Ok(swapped.is_ok())
    }

    pub fn dispatch_exists(&self, user_id: &str, dispatch_id: &str) -> Result<bool, StoreError> {
        let key = keys::dispatch_key(user_id, dispatch_id);
        Ok(self.notification_dispatch.contains_key(key.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> NotificationDispatch {
        NotificationDispatch {
            scheduled_date: "2026-03-02".to_string(),
            scheduled_time: "18:00".to_string(),
            phase: ReminderPhase::Now,
            block_type: ActivityType::Chat,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn first_claim_wins_second_is_refused() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("dispatch.sled").to_str().unwrap()).unwrap();
        let id = keys::dispatch_id("2026-03-02", "18:00", "now");

        assert!(store.try_claim_dispatch("u1", &id, &marker()).unwrap());
        assert!(!store.try_claim_dispatch("u1", &id, &marker()).unwrap());
        assert!(store.dispatch_exists("u1", &id).unwrap());
    }

    #[test]
    fn claims_are_scoped_per_user_and_phase() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("dispatch2.sled").to_str().unwrap()).unwrap();
        let now_id = keys::dispatch_id("2026-03-02", "18:00", "now");
        let pre_id = keys::dispatch_id("2026-03-02", "18:00", "pre");

        assert!(store.try_claim_dispatch("u1", &now_id, &marker()).unwrap());
        assert!(store.try_claim_dispatch("u1", &pre_id, &marker()).unwrap());
        assert!(store.try_claim_dispatch("u2", &now_id, &marker()).unwrap());
    }
}
