//! Chat-session lifecycle: creation under the daily cap, and completion
//! with schedule-window matching and difficulty adaptation.

use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::schedule::blocks::ActivityType;
use crate::services::adapter::run_on_session_completed;
use crate::services::schedule_window::mark_schedule_log_for_session_start;
use crate::store::operations::sessions::{Session, SessionStatus};
use crate::store::Store;
use crate::validation::{
    validate_count, validate_duration_ms, validate_id, validate_phoneme_list, validate_score,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedChatSession {
    pub session_id: String,
}

/// Create an active chat session. The per-day counter lives on the profile
/// and resets whenever the stored reset date is not today (UTC); queued
/// homework priorities are consumed by the new session and cleared.
pub fn create_chat_session(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    daily_session_limit: u32,
) -> Result<CreatedChatSession, ServiceError> {
    let Some(mut profile) = store.get_user_profile(user_id)? else {
        return Err(ServiceError::not_found(
            "user_not_found",
            "User profile not found.",
        ));
    };

    let now = clock.now();
    let today = now.format("%Y-%m-%d").to_string();
    let same_day = profile.daily_chat_reset_date.as_deref() == Some(today.as_str());

    if same_day && profile.daily_chat_count >= daily_session_limit {
        return Err(ServiceError::resource_exhausted(
            "daily_session_limit",
            &format!(
                "Limite de {daily_session_limit} sessões diárias atingido. Tente novamente amanhã."
            ),
        ));
    }

    let session_id = Uuid::new_v4().to_string();
    let session = Session::new_active(&session_id, user_id, ActivityType::Chat, now);
    store.put_session(&session)?;

    if same_day {
        profile.daily_chat_count += 1;
    } else {
        profile.daily_chat_count = 1;
        profile.daily_chat_reset_date = Some(today);
    }
    profile.homework_priority_queue.clear();
    profile.updated_at = now;
    store.put_user_profile(&profile)?;

    Ok(CreatedChatSession { session_id })
}

#[derive(Debug, Clone)]
pub struct CompleteChatSessionInput {
    pub session_id: String,
    pub duration_ms: i64,
    pub phonemes_corrected: Vec<String>,
    pub phonemes_pending: Vec<String>,
    pub overall_score: i64,
    pub total_corrections: u32,
    pub message_count: u32,
}

fn validate_completion(input: &CompleteChatSessionInput) -> Result<(), String> {
    validate_id(&input.session_id, "sessionId")?;
    validate_duration_ms(input.duration_ms)?;
    validate_phoneme_list(&input.phonemes_corrected, "phonemesCorrected")?;
    validate_phoneme_list(&input.phonemes_pending, "phonemesPending")?;
    validate_score(input.overall_score, "overallScore")?;
    validate_count(input.total_corrections, 1000, "totalCorrections")?;
    validate_count(input.message_count, 10_000, "messageCount")?;
    Ok(())
}

/// Complete an active chat session, then record schedule adherence for its
/// original start instant and re-run difficulty adaptation.
pub fn complete_chat_session(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    input: &CompleteChatSessionInput,
    tolerance_window_minutes: i64,
) -> Result<(), ServiceError> {
    validate_completion(input)
        .map_err(|message| ServiceError::invalid_argument("invalid_input", &message))?;

    let Some(mut session) = store.get_session(user_id, &input.session_id)? else {
        return Err(ServiceError::not_found(
            "session_not_found",
            "Session not found.",
        ));
    };
    if session.status != SessionStatus::Active {
        return Err(ServiceError::failed_precondition(
            "session_not_active",
            "Session is not active. Cannot complete.",
        ));
    }

    let now = clock.now();
    session.status = SessionStatus::Completed;
    session.duration_ms = Some(input.duration_ms);
    session.phonemes_corrected = input.phonemes_corrected.clone();
    session.phonemes_pending = input.phonemes_pending.clone();
    session.overall_score = Some(input.overall_score as f64);
    session.total_corrections = Some(input.total_corrections);
    session.message_count = Some(input.message_count);
    session.completed_at = Some(now);
    session.updated_at = now;
    store.put_session(&session)?;

    mark_schedule_log_for_session_start(
        store,
        clock,
        user_id,
        &session.id,
        ActivityType::Chat,
        session.started_at,
        tolerance_window_minutes,
    )?;

    run_on_session_completed(store, clock, user_id, &session)?;

    Ok(())
}
