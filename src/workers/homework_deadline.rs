//! Deadline sweep: pending homework past its deadline goes overdue, costs an
//! adherence point, and is pushed onto the priority queue so the next chat
//! session starts with it.

use uuid::Uuid;

use crate::clock::Clock;
use crate::store::operations::homework::HomeworkStatus;
use crate::store::operations::schedule_logs::{AlertReason, ScheduleAlert};
use crate::store::operations::users::UserProfile;
use crate::store::Store;

pub async fn run(store: &Store, clock: &dyn Clock) {
    tracing::info!("Homework deadline worker running");

    let now = clock.now();
    let overdue = match store.list_overdue_homework(now) {
        Ok(overdue) => overdue,
        Err(error) => {
            tracing::warn!(error = %error, "Deadline sweep: failed to scan homework");
            return;
        }
    };

    let mut marked = 0u32;
    for (user_id, mut homework) in overdue {
        homework.status = HomeworkStatus::Overdue;
        homework.updated_at = now;
        if let Err(error) = store.put_homework(&user_id, &homework) {
            tracing::warn!(user_id = %user_id, error = %error, "Failed to mark homework overdue");
            continue;
        }

        let mut profile = match store.get_user_profile(&user_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::shell(&user_id, now),
            Err(error) => {
                tracing::warn!(user_id = %user_id, error = %error, "Failed to read profile");
                continue;
            }
        };
        profile.adherence_score -= 1.0;
        profile.push_priority(&homework.content_ref);
        profile.updated_at = now;
        if let Err(error) = store.put_user_profile(&profile) {
            tracing::warn!(user_id = %user_id, error = %error, "Failed to update profile");
            continue;
        }

        let alert = ScheduleAlert {
            id: Uuid::new_v4().to_string(),
            reason: AlertReason::HomeworkOverdue,
            session_id: None,
            session_type: None,
            nearest_diff_minutes: None,
            tolerance_window_minutes: None,
            started_at: None,
            content_ref: Some(homework.content_ref.clone()),
            homework_id: Some(homework.id.clone()),
            created_at: now,
        };
        if let Err(error) = store.append_schedule_alert(&user_id, &alert) {
            tracing::warn!(user_id = %user_id, error = %error, "Failed to append overdue alert");
        }
        marked += 1;
    }

    tracing::info!(marked, "Homework deadline worker finished");
}
