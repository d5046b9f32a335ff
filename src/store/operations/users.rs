use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::{Adjustment, AreaZones, DifficultyMap, DifficultyStep, Zone};
use crate::scoring::CefrLevel;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// One line of the profile's adaptation history. `area` is a skill area name
/// or `"all"` for level resets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterHistoryEntry {
    pub date: DateTime<Utc>,
    pub area: String,
    pub zone: Zone,
    pub previous_zone: Zone,
    pub adjustment: Adjustment,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_before: Option<DifficultyStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_after: Option<DifficultyStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_id: Option<String>,
}

/// The user profile document. `weekly_blocks` stays a raw JSON value on
/// purpose: the field is client-written and parsed defensively at the point
/// of use (`schedule::blocks::parse_weekly_blocks`), so a malformed entry
/// can never poison profile reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub level: Option<CefrLevel>,
    pub level_score: Option<i64>,
    #[serde(default)]
    pub grammar_score: Option<f64>,
    #[serde(default)]
    pub listening_score: Option<f64>,
    #[serde(default)]
    pub speaking_score: Option<f64>,
    #[serde(default)]
    pub weak_phonemes: Vec<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub weekly_blocks: serde_json::Value,
    #[serde(default)]
    pub adherence_score: f64,
    #[serde(default)]
    pub homework_priority_queue: Vec<String>,
    #[serde(default)]
    pub adapter_state: Option<AreaZones>,
    #[serde(default)]
    pub current_difficulty: Option<DifficultyMap>,
    #[serde(default)]
    pub adapter_history: Vec<AdapterHistoryEntry>,
    #[serde(default)]
    pub daily_chat_count: u32,
    #[serde(default)]
    pub daily_chat_reset_date: Option<String>,
    #[serde(default)]
    pub diagnostic_completed: bool,
    #[serde(default)]
    pub last_diagnostic_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A minimal profile shell, used when a merge-style write targets a user
    /// document that does not exist yet.
    pub fn shell(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: user_id.to_string(),
            name: String::new(),
            email: String::new(),
            level: None,
            level_score: None,
            grammar_score: None,
            listening_score: None,
            speaking_score: None,
            weak_phonemes: Vec::new(),
            timezone: None,
            weekly_blocks: serde_json::Value::Null,
            adherence_score: 0.0,
            homework_priority_queue: Vec::new(),
            adapter_state: None,
            current_difficulty: None,
            adapter_history: Vec::new(),
            daily_chat_count: 0,
            daily_chat_reset_date: None,
            diagnostic_completed: false,
            last_diagnostic_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a content ref to the priority queue if absent (set semantics).
    pub fn push_priority(&mut self, content_ref: &str) {
        if !self.homework_priority_queue.iter().any(|r| r == content_ref) {
            self.homework_priority_queue.push(content_ref.to_string());
        }
    }

    pub fn remove_priority(&mut self, content_ref: &str) {
        self.homework_priority_queue.retain(|r| r != content_ref);
    }
}

impl Store {
    pub fn put_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let key = keys::user_key(&profile.id);
        self.users.insert(key.as_bytes(), Self::serialize(profile)?)?;
        Ok(())
    }

    pub fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let key = keys::user_key(user_id);
        match self.users.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// All profiles, for timer-scoped fan-out. Documents that fail to decode
    /// are skipped with a warning rather than aborting the scan.
    pub fn list_user_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        let mut profiles = Vec::new();
        for item in self.users.iter() {
            let (_, raw) = item?;
            match Self::deserialize::<UserProfile>(&raw) {
                Ok(profile) => profiles.push(profile),
                Err(error) => {
                    tracing::warn!(error = %error, "Skipping undecodable user profile");
                }
            }
        }
        Ok(profiles)
    }
}
