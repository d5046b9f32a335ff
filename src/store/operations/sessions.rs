use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::AreaZones;
use crate::schedule::blocks::ActivityType;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

/// How the adapter arrived at the snapshot stored on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterMeta {
    pub mode: String,
    pub sessions_considered: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_threshold: Option<usize>,
}

/// A practice session (conversational chat or structured lesson).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub session_type: ActivityType,
    pub status: SessionStatus,
    #[serde(default)]
    pub topic: Option<String>,
    pub duration_ms: Option<i64>,
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub grammar_score: Option<f64>,
    #[serde(default)]
    pub pronunciation_score: Option<f64>,
    #[serde(default)]
    pub vocabulary_score: Option<f64>,
    #[serde(default)]
    pub phonemes_corrected: Vec<String>,
    #[serde(default)]
    pub phonemes_pending: Vec<String>,
    #[serde(default)]
    pub total_corrections: Option<u32>,
    #[serde(default)]
    pub message_count: Option<u32>,
    #[serde(default)]
    pub adapter_snapshot: Option<AreaZones>,
    #[serde(default)]
    pub adapter_meta: Option<AdapterMeta>,
    #[serde(default)]
    pub adaptive_evaluation: Option<serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new_active(
        id: &str,
        user_id: &str,
        session_type: ActivityType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            session_type,
            status: SessionStatus::Active,
            topic: None,
            duration_ms: None,
            overall_score: None,
            grammar_score: None,
            pronunciation_score: None,
            vocabulary_score: None,
            phonemes_corrected: Vec::new(),
            phonemes_pending: Vec::new(),
            total_corrections: None,
            message_count: None,
            adapter_snapshot: None,
            adapter_meta: None,
            adaptive_evaluation: None,
            started_at: now,
            completed_at: None,
            updated_at: now,
        }
    }
}

impl Store {
    pub fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        let key = keys::session_key(&session.user_id, &session.id);
        self.sessions
            .insert(key.as_bytes(), Self::serialize(session)?)?;
        Ok(())
    }

    pub fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        let key = keys::session_key(user_id, session_id);
        match self.sessions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// A user's completed sessions, newest completion first.
    pub fn list_recent_completed_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>, StoreError> {
        let prefix = keys::session_prefix(user_id);
        let mut sessions = Vec::new();
        for item in self.sessions.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item?;
            let session: Session = Self::deserialize(&raw)?;
            if session.status == SessionStatus::Completed && session.completed_at.is_some() {
                sessions.push(session);
            }
        }
        sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}
