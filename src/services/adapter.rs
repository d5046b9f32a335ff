//! Difficulty adaptation after session completions and diagnostic resets.
//!
//! Runs over the most recent completed sessions, recomputes per-area zones
//! and ladder positions, records the decision trail, and queues
//! reinforcement homework for areas that averaged below passing.

use uuid::Uuid;

use crate::adapter::{
    adjustment_delta, average_tenths, compute_adjustment, consecutive_count, is_erratic,
    score_to_zone, AreaZones, DifficultyMap, SkillArea, Zone, MIN_SESSIONS, SKILL_AREAS,
    WINDOW_DEFAULT, WINDOW_ERRATIC,
};
use crate::clock::Clock;
use crate::constants::PASSING_SCORE;
use crate::scoring::CefrLevel;
use crate::services::homework::{queue_homework, QueueHomeworkInput};
use crate::store::operations::adaptations::Adaptation;
use crate::store::operations::diagnostics::Diagnostic;
use crate::store::operations::sessions::{AdapterMeta, Session};
use crate::store::operations::users::AdapterHistoryEntry;
use crate::store::{Store, StoreError};

/// Score used when a session carries no usable value for an area.
const NEUTRAL_SCORE: f64 = 70.0;

fn area_score(session: &Session, area: SkillArea) -> f64 {
    let overall = session.overall_score.unwrap_or(NEUTRAL_SCORE);
    let raw = match area {
        SkillArea::Grammar => session.grammar_score,
        SkillArea::Pronunciation => session.pronunciation_score,
        SkillArea::Vocabulary => session.vocabulary_score,
    };
    raw.unwrap_or(overall)
}

fn area_scores(sessions: &[Session], area: SkillArea) -> Vec<f64> {
    sessions.iter().map(|s| area_score(s, area)).collect()
}

fn zone_sequence(sessions: &[Session], area: SkillArea) -> Vec<Zone> {
    sessions
        .iter()
        .map(|s| score_to_zone(area_score(s, area)))
        .collect()
}

/// Recompute zones and ladder positions after a completed session. The
/// trigger session must already be persisted as completed; it receives the
/// adapter snapshot.
pub fn run_on_session_completed(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    trigger: &Session,
) -> Result<(), StoreError> {
    let Some(mut profile) = store.get_user_profile(user_id)? else {
        return Ok(());
    };

    let recent: Vec<Session> = store
        .list_recent_completed_sessions(user_id, 15)?
        .into_iter()
        .take(WINDOW_ERRATIC)
        .collect();

    let now = clock.now();
    let fallback_level = profile.level.unwrap_or(CefrLevel::A1);
    let prev_state = profile.adapter_state.unwrap_or_default();
    let prev_difficulty = profile
        .current_difficulty
        .unwrap_or_else(|| DifficultyMap::mid_for(fallback_level));

    // Too little signal: keep a neutral baseline, adapt nothing yet.
    if recent.len() < MIN_SESSIONS {
        profile.adapter_state = Some(prev_state);
        profile.updated_at = now;
        store.put_user_profile(&profile)?;

        if let Some(mut session) = store.get_session(user_id, &trigger.id)? {
            session.adapter_snapshot = Some(prev_state);
            session.adapter_meta = Some(AdapterMeta {
                mode: "diagnostic_fallback".to_string(),
                sessions_considered: recent.len(),
                consecutive_threshold: None,
            });
            session.updated_at = now;
            store.put_session(&session)?;
        }
        return Ok(());
    }

    let overall_scores: Vec<f64> = recent
        .iter()
        .map(|s| s.overall_score.unwrap_or(NEUTRAL_SCORE))
        .collect();
    let erratic = is_erratic(&overall_scores);
    let window = if erratic { WINDOW_ERRATIC } else { WINDOW_DEFAULT };
    let windowed = &recent[..recent.len().min(window)];

    let mut next_state = AreaZones::default();
    let mut next_difficulty = prev_difficulty;
    let mut averages = [0.0f64; 3];
    let mut streaks = [0usize; 3];

    for (idx, area) in SKILL_AREAS.into_iter().enumerate() {
        let avg = average_tenths(&area_scores(windowed, area));
        let zones = zone_sequence(windowed, area);
        averages[idx] = avg;
        streaks[idx] = consecutive_count(&zones);
        next_state.set(area, score_to_zone(avg));
        next_difficulty.set(area, prev_difficulty.get(area).shift(adjustment_delta(&zones)));
    }

    let history_reason = if erratic {
        "session_completed_erratic_ma7"
    } else {
        "session_completed_ma5"
    };
    let adaptation_reason = format!(
        "session_{}_completed_ma{}",
        trigger.session_type.as_str(),
        window
    );

    profile.adapter_state = Some(next_state);
    profile.current_difficulty = Some(next_difficulty);
    for area in SKILL_AREAS {
        profile.adapter_history.push(AdapterHistoryEntry {
            date: now,
            area: area.as_str().to_string(),
            zone: next_state.get(area),
            previous_zone: prev_state.get(area),
            adjustment: compute_adjustment(prev_state.get(area), next_state.get(area)),
            reason: history_reason.to_string(),
            difficulty_before: Some(prev_difficulty.get(area)),
            difficulty_after: Some(next_difficulty.get(area)),
            diagnostic_id: None,
        });
    }
    profile.updated_at = now;
    store.put_user_profile(&profile)?;

    if let Some(mut session) = store.get_session(user_id, &trigger.id)? {
        session.adapter_snapshot = Some(next_state);
        session.adapter_meta = Some(AdapterMeta {
            mode: format!("moving_average_{window}"),
            sessions_considered: windowed.len(),
            consecutive_threshold: Some(crate::adapter::CONSECUTIVE_SESSIONS_THRESHOLD),
        });
        session.updated_at = now;
        store.put_session(&session)?;
    }

    for (idx, area) in SKILL_AREAS.into_iter().enumerate() {
        store.append_adaptation(
            user_id,
            &Adaptation {
                id: Uuid::new_v4().to_string(),
                trigger_session_id: trigger.id.clone(),
                area,
                previous_zone: prev_state.get(area),
                new_zone: next_state.get(area),
                recent_accuracy: averages[idx],
                adjustment: compute_adjustment(prev_state.get(area), next_state.get(area)),
                reason: adaptation_reason.clone(),
                zone_streak: streaks[idx],
                difficulty_before: prev_difficulty.get(area),
                difficulty_after: next_difficulty.get(area),
                created_at: now,
            },
        )?;

        if averages[idx] < PASSING_SCORE {
            queue_homework(
                store,
                clock,
                user_id,
                &QueueHomeworkInput {
                    homework_id: format!("{}_{}", trigger.id, area),
                    source_session_id: trigger.id.clone(),
                    source_type: area,
                    content_ref: format!("reinforcement:{}:{}", area, trigger.id),
                },
            )?;
        }
    }

    Ok(())
}

/// A completed diagnostic that changed the user's level resets every zone to
/// ideal and re-centers the ladder at the new level's mid rung.
pub fn reset_on_diagnostic(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    diagnostic: &Diagnostic,
) -> Result<(), StoreError> {
    let Some(mut profile) = store.get_user_profile(user_id)? else {
        return Ok(());
    };

    let new_level = diagnostic
        .level_assigned
        .or(profile.level)
        .unwrap_or(CefrLevel::A1);
    let fallback_level = profile.level.unwrap_or(CefrLevel::A1);
    let current = profile
        .current_difficulty
        .unwrap_or_else(|| DifficultyMap::mid_for(fallback_level));

    if current.grammar.level() == new_level {
        return Ok(());
    }

    let now = clock.now();
    let reset = DifficultyMap::mid_for(new_level);
    profile.adapter_state = Some(AreaZones::default());
    profile.current_difficulty = Some(reset);
    profile.adapter_history.push(AdapterHistoryEntry {
        date: now,
        area: "all".to_string(),
        zone: Zone::Ideal,
        previous_zone: Zone::Ideal,
        adjustment: crate::adapter::Adjustment::Maintained,
        reason: "diagnostic_level_reset".to_string(),
        difficulty_before: Some(current.grammar),
        difficulty_after: Some(reset.grammar),
        diagnostic_id: Some(diagnostic.id.clone()),
    });
    profile.updated_at = now;
    store.put_user_profile(&profile)
}
