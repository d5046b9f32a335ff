use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A registered browser push endpoint for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: String,
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn put_push_subscription(
        &self,
        user_id: &str,
        subscription: &PushSubscription,
    ) -> Result<(), StoreError> {
        let key = keys::push_subscription_key(user_id, &subscription.id);
        self.push_subscriptions
            .insert(key.as_bytes(), Self::serialize(subscription)?)?;
        Ok(())
    }

    /// Subscription documents are client-shaped; entries that fail to decode
    /// are skipped rather than failing the whole read.
    pub fn list_push_subscriptions(
        &self,
        user_id: &str,
    ) -> Result<Vec<PushSubscription>, StoreError> {
        let prefix = keys::push_subscription_prefix(user_id);
        let mut subscriptions = Vec::new();
        for item in self.push_subscriptions.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item?;
            if let Ok(subscription) = Self::deserialize::<PushSubscription>(&raw) {
                subscriptions.push(subscription);
            }
        }
        Ok(subscriptions)
    }

    /// Remove every subscription record pointing at a gone endpoint.
    pub fn delete_push_subscriptions_by_endpoint(
        &self,
        user_id: &str,
        endpoint: &str,
    ) -> Result<u32, StoreError> {
        let prefix = keys::push_subscription_prefix(user_id);
        let mut stale_keys = Vec::new();
        for item in self.push_subscriptions.scan_prefix(prefix.as_bytes()) {
            let (key, raw) = item?;
            if let Ok(subscription) = Self::deserialize::<PushSubscription>(&raw) {
                if subscription.endpoint == endpoint {
                    stale_keys.push(key.to_vec());
                }
            }
        }

        let mut removed = 0u32;
        for key in stale_keys {
            if self.push_subscriptions.remove(key)?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(id: &str, endpoint: &str) -> PushSubscription {
        PushSubscription {
            id: id.to_string(),
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: "p256dh-key".to_string(),
                auth: "auth-secret".to_string(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn subscriptions_list_per_user() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("subs.sled").to_str().unwrap()).unwrap();

        store
            .put_push_subscription("u1", &subscription("p1", "https://push.example/1"))
            .unwrap();
        store
            .put_push_subscription("u2", &subscription("p2", "https://push.example/2"))
            .unwrap();

        let subs = store.list_push_subscriptions("u1").unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].endpoint, "https://push.example/1");
    }

    #[test]
    fn delete_by_endpoint_removes_all_matches() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("subs_del.sled").to_str().unwrap()).unwrap();

        store
            .put_push_subscription("u1", &subscription("p1", "https://push.example/dup"))
            .unwrap();
        store
            .put_push_subscription("u1", &subscription("p2", "https://push.example/dup"))
            .unwrap();
        store
            .put_push_subscription("u1", &subscription("p3", "https://push.example/keep"))
            .unwrap();

        let removed = store
            .delete_push_subscriptions_by_endpoint("u1", "https://push.example/dup")
            .unwrap();
        assert_eq!(removed, 2);

        let remaining = store.list_push_subscriptions("u1").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].endpoint, "https://push.example/keep");
    }

    #[test]
    fn undecodable_subscription_entries_are_skipped() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("subs_bad.sled").to_str().unwrap()).unwrap();
        store
            .put_push_subscription("u1", &subscription("p1", "https://push.example/1"))
            .unwrap();
        store
            .push_subscriptions
            .insert(b"u1:broken", b"{}".as_slice())
            .unwrap();

        let subs = store.list_push_subscriptions("u1").unwrap();
        assert_eq!(subs.len(), 1);
    }
}
