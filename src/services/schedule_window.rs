//! Schedule-window matching at session completion.
//!
//! When a session finishes we check whether it started close enough to one
//! of the user's declared weekly blocks. A match produces an idempotent
//! schedule log keyed by the block occurrence; a miss produces an alert. A
//! user without a declared schedule is never penalized: no blocks, no
//! writes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::constants::DEFAULT_TIMEZONE;
use crate::schedule::blocks::{parse_weekly_blocks, ActivityType, WeeklyBlock};
use crate::schedule::timezone::utc_offset_for;
use crate::schedule::window::nearest_candidate;
use crate::store::operations::schedule_logs::{
    AlertReason, ScheduleAlert, ScheduleLog, ScheduleLogStatus,
};
use crate::store::{Store, StoreError};

pub fn mark_schedule_log_for_session_start(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    session_id: &str,
    session_type: ActivityType,
    started_at: DateTime<Utc>,
    tolerance_window_minutes: i64,
) -> Result<(), StoreError> {
    let Some(profile) = store.get_user_profile(user_id)? else {
        return Ok(());
    };

    let parsed = parse_weekly_blocks(&profile.weekly_blocks);
    if parsed.dropped > 0 {
        tracing::debug!(
            user_id,
            dropped = parsed.dropped,
            "Ignored malformed weekly block entries"
        );
    }

    let blocks: Vec<WeeklyBlock> = parsed
        .blocks
        .into_iter()
        .filter(|block| block.block_type == session_type)
        .collect();
    if blocks.is_empty() {
        return Ok(());
    }

    let offset = utc_offset_for(profile.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE));
    let Some(nearest) = nearest_candidate(&blocks, started_at, offset) else {
        return Ok(());
    };

    let now = clock.now();

    if nearest.diff_minutes > tolerance_window_minutes as f64 {
        let alert = ScheduleAlert {
            id: Uuid::new_v4().to_string(),
            reason: AlertReason::OutsideToleranceWindow,
            session_id: Some(session_id.to_string()),
            session_type: Some(session_type),
            nearest_diff_minutes: Some(nearest.diff_minutes.round() as i64),
            tolerance_window_minutes: Some(tolerance_window_minutes),
            started_at: Some(started_at),
            content_ref: None,
            homework_id: None,
            created_at: now,
        };
        store.append_schedule_alert(user_id, &alert)?;
        return Ok(());
    }

    let log = ScheduleLog {
        scheduled_date: nearest.scheduled_iso_date(),
        scheduled_time: nearest.block.time.clone(),
        block_type: nearest.block.block_type,
        duration_minutes: nearest.block.duration_minutes,
        status: ScheduleLogStatus::Completed,
        session_id: session_id.to_string(),
        tolerance_window_minutes,
        completed_at: now,
        updated_at: now,
    };
    store.upsert_schedule_log(user_id, &log)
}
