use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::blocks::ActivityType;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleLogStatus {
    Scheduled,
    Completed,
    Missed,
}

/// Proof that a declared weekly block was honored. Keyed by the matched
/// occurrence (`{date}_{time}`), so repeated completions of the same
/// occurrence overwrite idempotently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleLog {
    pub scheduled_date: String,
    pub scheduled_time: String,
    #[serde(rename = "type")]
    pub block_type: ActivityType,
    pub duration_minutes: u32,
    pub status: ScheduleLogStatus,
    pub session_id: String,
    pub tolerance_window_minutes: i64,
    pub completed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    OutsideToleranceWindow,
    HomeworkOverdue,
}

/// Append-only diagnostic record: a session without a near-enough block, or
/// homework that went overdue. No lifecycle beyond creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAlert {
    pub id: String,
    pub reason: AlertReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_type: Option<ActivityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_diff_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_window_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homework_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Merge-style upsert keyed by the occurrence id.
    pub fn upsert_schedule_log(&self, user_id: &str, log: &ScheduleLog) -> Result<(), StoreError> {
        let log_id = keys::schedule_log_id(&log.scheduled_date, &log.scheduled_time);
        let key = keys::schedule_log_key(user_id, &log_id);
        self.schedule_logs
            .insert(key.as_bytes(), Self::serialize(log)?)?;
        Ok(())
    }

    pub fn get_schedule_log(
        &self,
        user_id: &str,
        scheduled_date: &str,
        scheduled_time: &str,
    ) -> Result<Option<ScheduleLog>, StoreError> {
        let log_id = keys::schedule_log_id(scheduled_date, scheduled_time);
        let key = keys::schedule_log_key(user_id, &log_id);
        match self.schedule_logs.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_schedule_logs(&self, user_id: &str) -> Result<Vec<ScheduleLog>, StoreError> {
        let prefix = keys::schedule_log_prefix(user_id);
        let mut logs = Vec::new();
        for item in self.schedule_logs.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item?;
            logs.push(Self::deserialize(&raw)?);
        }
        Ok(logs)
    }

    pub fn append_schedule_alert(
        &self,
        user_id: &str,
        alert: &ScheduleAlert,
    ) -> Result<(), StoreError> {
        let key =
            keys::schedule_alert_key(user_id, alert.created_at.timestamp_millis(), &alert.id);
        self.schedule_alerts
            .insert(key.as_bytes(), Self::serialize(alert)?)?;
        Ok(())
    }

    /// Alerts newest-first (reverse-timestamp key order).
    pub fn list_schedule_alerts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ScheduleAlert>, StoreError> {
        let prefix = keys::schedule_alert_prefix(user_id);
        let mut alerts = Vec::new();
        for item in self.schedule_alerts.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item?;
            alerts.push(Self::deserialize(&raw)?);
            if alerts.len() >= limit {
                break;
            }
        }
        Ok(alerts)
    }
}
