use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::{Adjustment, DifficultyStep, SkillArea, Zone};
use crate::store::keys;
use crate::store::{Store, StoreError};

/// One adapter decision for one skill area, appended after every adapted
/// session completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adaptation {
    pub id: String,
    pub trigger_session_id: String,
    pub area: SkillArea,
    pub previous_zone: Zone,
    pub new_zone: Zone,
    pub recent_accuracy: f64,
    pub adjustment: Adjustment,
    pub reason: String,
    pub zone_streak: usize,
    pub difficulty_before: DifficultyStep,
    pub difficulty_after: DifficultyStep,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn append_adaptation(
        &self,
        user_id: &str,
        adaptation: &Adaptation,
    ) -> Result<(), StoreError> {
        let key = keys::adaptation_key(
            user_id,
            adaptation.created_at.timestamp_millis(),
            &adaptation.id,
        );
        self.adaptations
            .insert(key.as_bytes(), Self::serialize(adaptation)?)?;
        Ok(())
    }

    pub fn list_adaptations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Adaptation>, StoreError> {
        let prefix = keys::adaptation_prefix(user_id);
        let mut adaptations = Vec::new();
        for item in self.adaptations.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item?;
            adaptations.push(Self::deserialize(&raw)?);
            if adaptations.len() >= limit {
                break;
            }
        }
        Ok(adaptations)
    }
}
