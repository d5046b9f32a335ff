//! Review-interval ladder for homework reinforcement.
//!
//! Items climb 1h -> 1d -> 3d -> 7d -> 30d one rung per passing score and
//! restart from 1h on any failure. After five passes an item graduates to
//! mastered and drops off the review schedule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MASTERY_REPETITIONS, PASSING_SCORE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewInterval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

/// The ladder in ascending order; indices are the persisted step values 0-4.
pub const LADDER: [ReviewInterval; 5] = [
    ReviewInterval::OneHour,
    ReviewInterval::OneDay,
    ReviewInterval::ThreeDays,
    ReviewInterval::SevenDays,
    ReviewInterval::ThirtyDays,
];

impl ReviewInterval {
    pub fn hours(self) -> i64 {
        match self {
            ReviewInterval::OneHour => 1,
            ReviewInterval::OneDay => 24,
            ReviewInterval::ThreeDays => 72,
            ReviewInterval::SevenDays => 168,
            ReviewInterval::ThirtyDays => 720,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewInterval::OneHour => "1h",
            ReviewInterval::OneDay => "1d",
            ReviewInterval::ThreeDays => "3d",
            ReviewInterval::SevenDays => "7d",
            ReviewInterval::ThirtyDays => "30d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressionStatus {
    Pending,
    Completed,
    Mastered,
}

/// Outcome of one review evaluation. Computed fresh each time from the prior
/// repetition count and the new score; holds no identity of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub status: ProgressionStatus,
    pub interval: ReviewInterval,
    pub repetition_count: u32,
    pub next_review_at: Option<DateTime<Utc>>,
    pub spaced_repetition_step: u8,
}

/// Advance, reset or graduate an item given its repetition count and the
/// latest score. `now` is the evaluation instant; the next review is always
/// scheduled relative to it, never to the previously stored due time.
pub fn process_spaced_repetition(repetition_count: u32, score: f64, now: DateTime<Utc>) -> Progression {
    // Fail path: restart the curve at 1h.
    if score < PASSING_SCORE {
        return Progression {
            status: ProgressionStatus::Pending,
            interval: ReviewInterval::OneHour,
            repetition_count: 1,
            next_review_at: Some(now + Duration::hours(ReviewInterval::OneHour.hours())),
            spaced_repetition_step: 0,
        };
    }

    if repetition_count >= MASTERY_REPETITIONS {
        return Progression {
            status: ProgressionStatus::Mastered,
            interval: ReviewInterval::ThirtyDays,
            repetition_count: repetition_count + 1,
            next_review_at: None,
            spaced_repetition_step: (LADDER.len() - 1) as u8,
        };
    }

    let index = (repetition_count as usize).min(LADDER.len() - 1);
    let interval = LADDER[index];

    Progression {
        status: ProgressionStatus::Completed,
        interval,
        repetition_count: repetition_count + 1,
        next_review_at: Some(now + Duration::hours(interval.hours())),
        spaced_repetition_step: index as u8,
    }
}
