use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Locked,
    Available,
    InProgress,
    Completed,
}

/// One graded exercise inside a completed module, after id/answer
/// normalization. `correct`/`score` stay `None` for non-objective exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOutcome {
    pub exercise_id: String,
    pub canonical_exercise_id: String,
    #[serde(rename = "type")]
    pub exercise_type: String,
    pub attempts: u32,
    pub answer: Option<String>,
    pub correct: Option<bool>,
    pub score: Option<i64>,
}

/// Review-ladder slot for a weak exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSlot {
    pub exercise_id: String,
    pub step: usize,
    pub interval_hours: i64,
    pub next_review_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub module_id: String,
    pub module_title: String,
    pub level: String,
    pub status: LessonStatus,
    pub current_block: u32,
    pub total_blocks: u32,
    pub score: Option<i64>,
    #[serde(default)]
    pub exercise_results: Vec<ExerciseOutcome>,
    #[serde(default)]
    pub weak_exercises: Vec<String>,
    #[serde(default)]
    pub review_schedule: Vec<ReviewSlot>,
    #[serde(default)]
    pub unlocked: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Server-side cache of a generated lesson; the answer key lives here and
/// never reaches the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedExercise {
    pub id: String,
    #[serde(rename = "type")]
    pub exercise_type: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CachedLesson {
    pub exercises: Vec<CachedExercise>,
}

impl Store {
    pub fn put_lesson_progress(
        &self,
        user_id: &str,
        progress: &LessonProgress,
    ) -> Result<(), StoreError> {
        let key = keys::lesson_progress_key(user_id, &progress.module_id);
        self.lesson_progress
            .insert(key.as_bytes(), Self::serialize(progress)?)?;
        Ok(())
    }

    pub fn get_lesson_progress(
        &self,
        user_id: &str,
        module_id: &str,
    ) -> Result<Option<LessonProgress>, StoreError> {
        let key = keys::lesson_progress_key(user_id, module_id);
        match self.lesson_progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_lesson_cache(
        &self,
        user_id: &str,
        module_id: &str,
        lesson: &CachedLesson,
    ) -> Result<(), StoreError> {
        let key = keys::lesson_cache_key(user_id, module_id);
        self.lesson_cache
            .insert(key.as_bytes(), Self::serialize(lesson)?)?;
        Ok(())
    }

    pub fn get_lesson_cache(
        &self,
        user_id: &str,
        module_id: &str,
    ) -> Result<Option<CachedLesson>, StoreError> {
        let key = keys::lesson_cache_key(user_id, module_id);
        match self.lesson_cache.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_progress_round_trips() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("lessons.sled").to_str().unwrap()).unwrap();

        let progress = LessonProgress {
            module_id: "a1-3".to_string(),
            module_title: "Saludos".to_string(),
            level: "A1".to_string(),
            status: LessonStatus::Completed,
            current_block: 5,
            total_blocks: 5,
            score: Some(80),
            exercise_results: Vec::new(),
            weak_exercises: Vec::new(),
            review_schedule: Vec::new(),
            unlocked: false,
            completed_at: Some(Utc::now()),
            updated_at: Utc::now(),
        };
        store.put_lesson_progress("u1", &progress).unwrap();

        let loaded = store
            .get_lesson_progress("u1", "a1-3")
            .unwrap()
            .expect("progress");
        assert_eq!(loaded.status, LessonStatus::Completed);
        assert!(store.get_lesson_progress("u1", "a1-4").unwrap().is_none());
    }

    #[test]
    fn lesson_cache_round_trips() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("cache.sled").to_str().unwrap()).unwrap();

        let lesson = CachedLesson {
            exercises: vec![CachedExercise {
                id: "e1".to_string(),
                exercise_type: "fill_blank".to_string(),
                answer: "está".to_string(),
            }],
        };
        store.put_lesson_cache("u1", "a1-3", &lesson).unwrap();

        let loaded = store.get_lesson_cache("u1", "a1-3").unwrap().expect("cache");
        assert_eq!(loaded.exercises[0].answer, "está");
    }
}
