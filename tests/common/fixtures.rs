use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use espanhol_backend::schedule::timezone::utc_offset_for;
use espanhol_backend::store::operations::subscriptions::{PushSubscription, SubscriptionKeys};
use espanhol_backend::store::operations::users::UserProfile;
use espanhol_backend::store::Store;

pub fn setup_store(db_name: &str) -> (tempfile::TempDir, Arc<Store>) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let db_path = temp_dir.path().join(db_name);
    let store = Arc::new(Store::open(db_path.to_str().expect("db path")).expect("open store"));
    (temp_dir, store)
}

pub fn seed_profile(
    store: &Store,
    user_id: &str,
    timezone: &str,
    weekly_blocks: serde_json::Value,
) -> UserProfile {
    let mut profile = UserProfile::shell(user_id, Utc::now());
    profile.name = format!("user-{user_id}");
    profile.email = format!("{user_id}@example.com");
    profile.timezone = Some(timezone.to_string());
    profile.weekly_blocks = weekly_blocks;
    store.put_user_profile(&profile).expect("seed profile");
    profile
}

pub fn seed_subscription(store: &Store, user_id: &str, id: &str, endpoint: &str) {
    let subscription = PushSubscription {
        id: id.to_string(),
        endpoint: endpoint.to_string(),
        keys: SubscriptionKeys {
            p256dh: format!("p256dh-{id}"),
            auth: format!("auth-{id}"),
        },
        created_at: Utc::now(),
    };
    store
        .put_push_subscription(user_id, &subscription)
        .expect("seed subscription");
}

/// An instant expressed as local wall-clock time in the given zone.
pub fn local_instant(zone: &str, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    utc_offset_for(zone)
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .expect("local instant")
        .with_timezone(&Utc)
}
