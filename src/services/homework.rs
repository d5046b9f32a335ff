//! Homework lifecycle: queueing reinforcement work, applying the review
//! ladder on completion, and keeping the profile's adherence score and
//! priority queue in sync.

use serde::Serialize;

use crate::adapter::SkillArea;
use crate::clock::Clock;
use crate::constants::{HOMEWORK_DEADLINE_HOURS, LATE_COMPLETION_CREDIT, PASSING_SCORE};
use crate::error::ServiceError;
use crate::spaced_repetition::{process_spaced_repetition, ProgressionStatus, ReviewInterval};
use crate::store::operations::homework::{Homework, HomeworkStatus};
use crate::store::operations::users::UserProfile;
use crate::store::{Store, StoreError};
use crate::validation::{validate_id, validate_score};

#[derive(Debug, Clone)]
pub struct QueueHomeworkInput {
    pub homework_id: String,
    pub source_session_id: String,
    pub source_type: SkillArea,
    pub content_ref: String,
}

/// Upsert a pending homework document with a fresh 48h deadline and a reset
/// ladder position. Re-queueing an existing id restarts it.
pub fn queue_homework(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    input: &QueueHomeworkInput,
) -> Result<(), StoreError> {
    let now = clock.now();
    let homework = Homework {
        id: input.homework_id.clone(),
        source_session_id: input.source_session_id.clone(),
        source_type: input.source_type,
        content_ref: input.content_ref.clone(),
        status: HomeworkStatus::Pending,
        score: None,
        deadline: now + chrono::Duration::hours(HOMEWORK_DEADLINE_HOURS),
        interval: ReviewInterval::OneHour,
        repetition_count: 0,
        spaced_repetition_step: 0,
        next_review_at: None,
        attempts: 0,
        created_at: now,
        completed_at: None,
        mastered_at: None,
        updated_at: now,
    };
    store.put_homework(user_id, &homework)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedHomework {
    pub status: HomeworkStatus,
    pub accepted: bool,
    pub credit_applied: f64,
}

pub fn complete_homework(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    homework_id: &str,
    score: i64,
) -> Result<CompletedHomework, ServiceError> {
    validate_id(homework_id, "homeworkId")
        .map_err(|message| ServiceError::invalid_argument("invalid_homework_id", &message))?;
    validate_score(score, "score")
        .map_err(|message| ServiceError::invalid_argument("invalid_score", &message))?;

    let Some(mut homework) = store.get_homework(user_id, homework_id)? else {
        return Err(ServiceError::not_found(
            "homework_not_found",
            "Homework not found.",
        ));
    };

    let now = clock.now();
    let was_overdue = homework.status == HomeworkStatus::Overdue;
    let progression = process_spaced_repetition(homework.repetition_count, score as f64, now);
    let passed = score as f64 >= PASSING_SCORE;
    // Overdue work still earns credit, just half of it.
    let late_credit = if was_overdue { LATE_COMPLETION_CREDIT } else { 1.0 };

    homework.status = match progression.status {
        ProgressionStatus::Pending => HomeworkStatus::Pending,
        ProgressionStatus::Completed => HomeworkStatus::Completed,
        ProgressionStatus::Mastered => HomeworkStatus::Mastered,
    };
    homework.score = Some(score);
    homework.attempts += 1;
    homework.interval = progression.interval;
    homework.repetition_count = progression.repetition_count;
    homework.spaced_repetition_step = progression.spaced_repetition_step;
    homework.next_review_at = progression.next_review_at;
    if passed {
        homework.completed_at = Some(now);
    }
    if progression.status == ProgressionStatus::Mastered {
        homework.mastered_at = Some(now);
    }
    homework.updated_at = now;
    store.put_homework(user_id, &homework)?;

    let mut profile = store
        .get_user_profile(user_id)?
        .unwrap_or_else(|| UserProfile::shell(user_id, now));
    if passed {
        profile.adherence_score += late_credit;
    }
    if progression.status == ProgressionStatus::Mastered {
        profile.remove_priority(&homework.content_ref);
    } else {
        profile.push_priority(&homework.content_ref);
    }
    profile.updated_at = now;
    store.put_user_profile(&profile)?;

    Ok(CompletedHomework {
        status: homework.status,
        accepted: passed,
        credit_applied: if passed { late_credit } else { 0.0 },
    })
}
