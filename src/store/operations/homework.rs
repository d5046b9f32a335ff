use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::SkillArea;
use crate::spaced_repetition::ReviewInterval;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeworkStatus {
    Pending,
    Completed,
    Mastered,
    Overdue,
}

/// A reinforcement assignment generated from a weak session or lesson, moved
/// along the review ladder on each completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homework {
    pub id: String,
    pub source_session_id: String,
    pub source_type: SkillArea,
    pub content_ref: String,
    pub status: HomeworkStatus,
    pub score: Option<i64>,
    pub deadline: DateTime<Utc>,
    pub interval: ReviewInterval,
    pub repetition_count: u32,
    pub spaced_repetition_step: u8,
    pub next_review_at: Option<DateTime<Utc>>,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mastered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn put_homework(&self, user_id: &str, homework: &Homework) -> Result<(), StoreError> {
        let key = keys::homework_key(user_id, &homework.id);
        self.homework
            .insert(key.as_bytes(), Self::serialize(homework)?)?;
        Ok(())
    }

    pub fn get_homework(
        &self,
        user_id: &str,
        homework_id: &str,
    ) -> Result<Option<Homework>, StoreError> {
        let key = keys::homework_key(user_id, homework_id);
        match self.homework.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Pending homework whose deadline has passed, across all users. The scan
    /// is tree-wide; the owning user id is recovered from the key prefix.
    pub fn list_overdue_homework(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, Homework)>, StoreError> {
        let mut overdue = Vec::new();
        for item in self.homework.iter() {
            let (key, raw) = item?;
            let homework: Homework = match Self::deserialize(&raw) {
                Ok(hw) => hw,
                Err(error) => {
                    tracing::warn!(error = %error, "Skipping undecodable homework document");
                    continue;
                }
            };
            if homework.status != HomeworkStatus::Pending || homework.deadline > now {
                continue;
            }
            let key_str = String::from_utf8_lossy(&key);
            let Some((user_id, _)) = key_str.split_once(':') else {
                continue;
            };
            overdue.push((user_id.to_string(), homework));
        }
        Ok(overdue)
    }
}
