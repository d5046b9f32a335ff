//! Adaptive-difficulty math: practice zones per skill area and the 15-step
//! difficulty ladder sessions move along.
//!
//! Zones come from a moving average over recent completed sessions; the
//! window widens from 5 to 7 when scores are erratic. The ladder only shifts
//! after three consecutive sessions land in the same non-ideal zone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scoring::CefrLevel;

/// Sessions required before difficulty adaptation kicks in at all.
pub const MIN_SESSIONS: usize = 3;
/// Moving-average window for stable score sequences.
pub const WINDOW_DEFAULT: usize = 5;
/// Widened window applied when the sequence is erratic.
pub const WINDOW_ERRATIC: usize = 7;
/// Consecutive same-zone sessions required to shift the ladder.
pub const CONSECUTIVE_SESSIONS_THRESHOLD: usize = 3;
/// Score jump between consecutive sessions that marks a sequence erratic.
pub const ERRATIC_DELTA: f64 = 20.0;

/// Skill areas tracked by the adapter and reinforced through homework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillArea {
    Grammar,
    Pronunciation,
    Vocabulary,
}

pub const SKILL_AREAS: [SkillArea; 3] = [
    SkillArea::Grammar,
    SkillArea::Pronunciation,
    SkillArea::Vocabulary,
];

impl SkillArea {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillArea::Grammar => "grammar",
            SkillArea::Pronunciation => "pronunciation",
            SkillArea::Vocabulary => "vocabulary",
        }
    }
}

impl fmt::Display for SkillArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where recent performance places an area relative to its difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Zone {
    TooEasy,
    Ideal,
    TooHard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    Increased,
    Maintained,
    Decreased,
}

/// Per-area zone map stored on the profile and snapshotted onto sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaZones {
    pub grammar: Zone,
    pub pronunciation: Zone,
    pub vocabulary: Zone,
}

impl Default for AreaZones {
    fn default() -> Self {
        Self {
            grammar: Zone::Ideal,
            pronunciation: Zone::Ideal,
            vocabulary: Zone::Ideal,
        }
    }
}

impl AreaZones {
    pub fn get(&self, area: SkillArea) -> Zone {
        match area {
            SkillArea::Grammar => self.grammar,
            SkillArea::Pronunciation => self.pronunciation,
            SkillArea::Vocabulary => self.vocabulary,
        }
    }

    pub fn set(&mut self, area: SkillArea, zone: Zone) {
        match area {
            SkillArea::Grammar => self.grammar = zone,
            SkillArea::Pronunciation => self.pronunciation = zone,
            SkillArea::Vocabulary => self.vocabulary = zone,
        }
    }
}

const LADDER_LABELS: [&str; 15] = [
    "A1-low", "A1-mid", "A1-high", "A2-low", "A2-mid", "A2-high", "B1-low", "B1-mid", "B1-high",
    "B2-low", "B2-mid", "B2-high", "C1-low", "C1-mid", "C1-high",
];

/// Position on the `A1-low .. C1-high` ladder, persisted as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DifficultyStep(usize);

impl DifficultyStep {
    /// The `-mid` rung of a level; the neutral starting point.
    pub fn mid_for(level: CefrLevel) -> Self {
        let level_index = CefrLevel::ALL
            .iter()
            .position(|l| *l == level)
            .unwrap_or(0);
        Self(level_index * 3 + 1)
    }

    pub fn parse(value: &str) -> Option<Self> {
        LADDER_LABELS.iter().position(|l| *l == value).map(Self)
    }

    pub fn as_str(self) -> &'static str {
        LADDER_LABELS[self.0]
    }

    pub fn level(self) -> CefrLevel {
        CefrLevel::ALL[self.0 / 3]
    }

    /// Move along the ladder, clamped at both ends.
    pub fn shift(self, delta: i8) -> Self {
        let next = (self.0 as i64 + i64::from(delta))
            .clamp(0, (LADDER_LABELS.len() - 1) as i64);
        Self(next as usize)
    }
}

impl fmt::Display for DifficultyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for DifficultyStep {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DifficultyStep::parse(&value).ok_or_else(|| format!("unknown difficulty step: {value}"))
    }
}

impl From<DifficultyStep> for String {
    fn from(value: DifficultyStep) -> Self {
        value.as_str().to_string()
    }
}

/// Per-area ladder positions stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyMap {
    pub grammar: DifficultyStep,
    pub pronunciation: DifficultyStep,
    pub vocabulary: DifficultyStep,
}

impl DifficultyMap {
    pub fn mid_for(level: CefrLevel) -> Self {
        let mid = DifficultyStep::mid_for(level);
        Self {
            grammar: mid,
            pronunciation: mid,
            vocabulary: mid,
        }
    }

    pub fn get(&self, area: SkillArea) -> DifficultyStep {
        match area {
            SkillArea::Grammar => self.grammar,
            SkillArea::Pronunciation => self.pronunciation,
            SkillArea::Vocabulary => self.vocabulary,
        }
    }

    pub fn set(&mut self, area: SkillArea, step: DifficultyStep) {
        match area {
            SkillArea::Grammar => self.grammar = step,
            SkillArea::Pronunciation => self.pronunciation = step,
            SkillArea::Vocabulary => self.vocabulary = step,
        }
    }
}

/// >80 is too easy, 60-80 ideal, below 60 too hard.
pub fn score_to_zone(score: f64) -> Zone {
    if score > 80.0 {
        Zone::TooEasy
    } else if score >= 60.0 {
        Zone::Ideal
    } else {
        Zone::TooHard
    }
}

fn zone_weight(zone: Zone) -> u8 {
    match zone {
        Zone::TooHard => 0,
        Zone::Ideal => 1,
        Zone::TooEasy => 2,
    }
}

pub fn compute_adjustment(previous: Zone, next: Zone) -> Adjustment {
    let prev = zone_weight(previous);
    let new = zone_weight(next);
    if new > prev {
        Adjustment::Increased
    } else if new < prev {
        Adjustment::Decreased
    } else {
        Adjustment::Maintained
    }
}

/// A sequence is erratic when any two consecutive scores jump by more than
/// [`ERRATIC_DELTA`]. Needs at least three data points to say anything.
pub fn is_erratic(scores: &[f64]) -> bool {
    if scores.len() < 3 {
        return false;
    }
    scores
        .windows(2)
        .any(|pair| (pair[0] - pair[1]).abs() > ERRATIC_DELTA)
}

/// Mean rounded to one decimal place.
pub fn average_tenths(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().sum();
    ((total / values.len() as f64) * 10.0).round() / 10.0
}

/// Length of the leading run of identical zones (newest first).
pub fn consecutive_count(zones: &[Zone]) -> usize {
    let Some(first) = zones.first() else {
        return 0;
    };
    zones.iter().take_while(|z| *z == first).count()
}

/// Ladder delta for a zone sequence: a streak of at least three "tooEasy"
/// sessions moves up, "tooHard" moves down, anything else holds.
pub fn adjustment_delta(zones: &[Zone]) -> i8 {
    if zones.len() < CONSECUTIVE_SESSIONS_THRESHOLD {
        return 0;
    }
    if consecutive_count(zones) < CONSECUTIVE_SESSIONS_THRESHOLD {
        return 0;
    }
    match zones[0] {
        Zone::TooEasy => 1,
        Zone::TooHard => -1,
        Zone::Ideal => 0,
    }
}
