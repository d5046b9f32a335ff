//! Lesson-module completion: grade submitted answers against the cached
//! answer key, schedule weak exercises for review, unlock the next module in
//! the track, and queue reinforcement homework for weak lessons.

use std::collections::HashMap;

use serde::Serialize;

use crate::adapter::SkillArea;
use crate::clock::Clock;
use crate::constants::{MODULE_UNLOCK_SCORE, PASSING_SCORE};
use crate::error::ServiceError;
use crate::services::homework::{queue_homework, QueueHomeworkInput};
use crate::spaced_repetition::LADDER;
use crate::store::operations::lesson_progress::{
    CachedExercise, ExerciseOutcome, LessonProgress, LessonStatus, ReviewSlot,
};
use crate::store::Store;
use crate::validation::{validate_id, validate_text};

#[derive(Debug, Clone)]
pub struct ExerciseResultInput {
    pub exercise_id: String,
    pub attempts: u32,
    pub answer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NextModuleInput {
    pub id: String,
    pub title: String,
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct CompleteLessonModuleInput {
    pub module_id: String,
    pub module_title: String,
    pub level: String,
    pub total_blocks: u32,
    pub exercise_results: Vec<ExerciseResultInput>,
    pub next_module: Option<NextModuleInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletion {
    pub final_score: i64,
    pub unlocked_next_module: bool,
    pub unlocked_module_id: Option<String>,
}

/// Module ids look like `a1-3`: a track (level letter + digit) and a
/// 1-based order within the track.
pub fn parse_module_id(module_id: &str) -> Option<(String, u32)> {
    let trimmed = module_id.trim();
    let (track, order) = trimmed.split_once('-')?;
    let bytes = track.as_bytes();
    if bytes.len() != 2 || !bytes[0].is_ascii_alphabetic() || !bytes[1].is_ascii_digit() {
        return None;
    }
    let order: u32 = order.parse().ok()?;
    if order == 0 {
        return None;
    }
    Some((track.to_ascii_lowercase(), order))
}

/// Unlocking is strictly sequential within a track.
pub fn can_unlock_next(current_module_id: &str, next_module_id: &str) -> bool {
    match (parse_module_id(current_module_id), parse_module_id(next_module_id)) {
        (Some((cur_track, cur_order)), Some((next_track, next_order))) => {
            cur_track == next_track && next_order == cur_order + 1
        }
        _ => false,
    }
}

/// First-try correct is full marks; corrected on retry is a pass; wrong is
/// partial credit for the attempt.
pub fn score_by_attempts(attempts: u32, correct: bool) -> i64 {
    if correct && attempts == 1 {
        100
    } else if correct {
        70
    } else {
        40
    }
}

/// Client exercise ids may be namespaced (`block:ex1`) and suffixed on retry
/// (`ex1__retry`); the canonical id strips both.
pub fn normalize_exercise_id(exercise_id: &str) -> String {
    let raw = exercise_id
        .rsplit_once(':')
        .map_or(exercise_id, |(_, tail)| tail);
    raw.strip_suffix("__retry").unwrap_or(raw).to_string()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Comparison form of an answer: trimmed, lowercased, accents folded so
/// "esta" matches "está".
pub fn normalize_answer(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .collect()
}

/// Review ladder for weak exercises: a known exercise climbs one step
/// (capped at the top), a new one starts at the bottom.
pub fn build_review_schedule(
    weak_exercise_ids: &[String],
    previous_steps: &HashMap<String, usize>,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<ReviewSlot> {
    weak_exercise_ids
        .iter()
        .map(|exercise_id| {
            let step = previous_steps
                .get(exercise_id)
                .map_or(0, |prev| (prev + 1).min(LADDER.len() - 1));
            let interval_hours = LADDER[step].hours();
            ReviewSlot {
                exercise_id: exercise_id.clone(),
                step,
                interval_hours,
                next_review_at: now + chrono::Duration::hours(interval_hours),
            }
        })
        .collect()
}

fn is_objective(exercise_type: &str) -> bool {
    matches!(exercise_type, "multiple_choice" | "fill_blank")
}

fn validate_input(input: &CompleteLessonModuleInput) -> Result<(), String> {
    validate_text(&input.module_id, 32, "moduleId")?;
    validate_text(&input.module_title, 120, "moduleTitle")?;
    validate_text(&input.level, 8, "level")?;
    if !(1..=20).contains(&input.total_blocks) {
        return Err("totalBlocks must be between 1 and 20".to_string());
    }
    if input.exercise_results.len() > 100 {
        return Err("exerciseResults accepts at most 100 entries".to_string());
    }
    for result in &input.exercise_results {
        validate_id(&result.exercise_id, "exerciseId")?;
        if !(1..=2).contains(&result.attempts) {
            return Err("attempts must be 1 or 2".to_string());
        }
    }
    Ok(())
}

pub fn complete_lesson_module(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    input: &CompleteLessonModuleInput,
) -> Result<LessonCompletion, ServiceError> {
    validate_input(input)
        .map_err(|message| ServiceError::invalid_argument("invalid_input", &message))?;

    let exercises: HashMap<String, CachedExercise> = store
        .get_lesson_cache(user_id, &input.module_id)?
        .map(|lesson| {
            lesson
                .exercises
                .into_iter()
                .map(|ex| (ex.id.clone(), ex))
                .collect()
        })
        .unwrap_or_default();
    if exercises.is_empty() {
        return Err(ServiceError::failed_precondition(
            "lesson_cache_missing",
            "Lesson cache not found or invalid. Generate lesson first.",
        ));
    }

    let previous_steps: HashMap<String, usize> = store
        .get_lesson_progress(user_id, &input.module_id)?
        .map(|existing| {
            existing
                .review_schedule
                .iter()
                .map(|slot| (normalize_exercise_id(&slot.exercise_id), slot.step))
                .collect()
        })
        .unwrap_or_default();

    let mut outcomes = Vec::with_capacity(input.exercise_results.len());
    for result in &input.exercise_results {
        let canonical_id = normalize_exercise_id(&result.exercise_id);
        let Some(exercise) = exercises.get(&canonical_id) else {
            return Err(ServiceError::invalid_argument(
                "exercise_not_in_lesson",
                &format!("Exercise does not belong to lesson: {}", result.exercise_id),
            ));
        };

        let objective = is_objective(&exercise.exercise_type);
        let correct = if objective {
            let submitted = normalize_answer(result.answer.as_deref().unwrap_or(""));
            Some(!submitted.is_empty() && submitted == normalize_answer(&exercise.answer))
        } else {
            None
        };
        let score = correct.map(|c| score_by_attempts(result.attempts, c));

        outcomes.push(ExerciseOutcome {
            exercise_id: result.exercise_id.clone(),
            canonical_exercise_id: canonical_id,
            exercise_type: exercise.exercise_type.clone(),
            attempts: result.attempts,
            answer: result.answer.clone(),
            correct,
            score,
        });
    }

    // Best score per canonical exercise; retries can only help.
    let mut score_by_exercise: HashMap<String, i64> = HashMap::new();
    for outcome in &outcomes {
        if let Some(score) = outcome.score {
            score_by_exercise
                .entry(outcome.canonical_exercise_id.clone())
                .and_modify(|best| *best = (*best).max(score))
                .or_insert(score);
        }
    }

    let final_score = if score_by_exercise.is_empty() {
        0
    } else {
        let total: i64 = score_by_exercise.values().sum();
        (total as f64 / score_by_exercise.len() as f64).round() as i64
    };

    let mut weak_exercise_ids: Vec<String> = score_by_exercise
        .iter()
        .filter(|(_, score)| (**score as f64) < PASSING_SCORE)
        .map(|(id, _)| id.clone())
        .collect();
    weak_exercise_ids.sort();

    let now = clock.now();
    let review_schedule = build_review_schedule(&weak_exercise_ids, &previous_steps, now);

    let unlock_target = input
        .next_module
        .as_ref()
        .filter(|next| {
            final_score >= MODULE_UNLOCK_SCORE && can_unlock_next(&input.module_id, &next.id)
        });
    let should_unlock = unlock_target.is_some();

    let progress = LessonProgress {
        module_id: input.module_id.clone(),
        module_title: input.module_title.clone(),
        level: input.level.clone(),
        status: LessonStatus::Completed,
        current_block: input.total_blocks,
        total_blocks: input.total_blocks,
        score: Some(final_score),
        exercise_results: outcomes,
        weak_exercises: weak_exercise_ids,
        review_schedule,
        unlocked: false,
        completed_at: Some(now),
        updated_at: now,
    };
    store.put_lesson_progress(user_id, &progress)?;

    let unlocked_module_id = if let Some(next) = unlock_target {
        let next_progress = match store.get_lesson_progress(user_id, &next.id)? {
            Some(mut existing) => {
                existing.status = LessonStatus::Available;
                existing.unlocked = true;
                existing.updated_at = now;
                existing
            }
            None => LessonProgress {
                module_id: next.id.clone(),
                module_title: next.title.clone(),
                level: next.level.clone(),
                status: LessonStatus::Available,
                current_block: 0,
                total_blocks: 0,
                score: None,
                exercise_results: Vec::new(),
                weak_exercises: Vec::new(),
                review_schedule: Vec::new(),
                unlocked: true,
                completed_at: None,
                updated_at: now,
            },
        };
        store.put_lesson_progress(user_id, &next_progress)?;
        Some(next.id.clone())
    } else {
        None
    };

    // A weak lesson generates one reinforcement homework keyed off the
    // weakest exercise type.
    if (final_score as f64) < PASSING_SCORE {
        let mut weakest_type = "fill_blank".to_string();
        let mut weakest_score = i64::MAX;
        for outcome in &progress.exercise_results {
            if let Some(score) = outcome.score {
                if score < weakest_score {
                    weakest_score = score;
                    weakest_type = outcome.exercise_type.clone();
                }
            }
        }
        let source_type = if weakest_type == "fill_blank" {
            SkillArea::Grammar
        } else {
            SkillArea::Vocabulary
        };
        queue_homework(
            store,
            clock,
            user_id,
            &QueueHomeworkInput {
                homework_id: format!("lesson_{}", input.module_id),
                source_session_id: format!("lesson:{}", input.module_id),
                source_type,
                content_ref: format!(
                    "lesson:{}:reinforcement:{}",
                    input.module_id,
                    source_type.as_str()
                ),
            },
        )?;
    }

    Ok(LessonCompletion {
        final_score,
        unlocked_next_module: should_unlock,
        unlocked_module_id,
    })
}
