//! Diagnostic scoring: weighted overall score, CEFR banding and the
//! qualitative strength/weakness tags shown to the learner.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{STRENGTH_THRESHOLD, WEAKNESS_THRESHOLD};

/// CEFR proficiency band assigned by the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 5] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
        }
    }

    pub fn parse(value: &str) -> Option<CefrLevel> {
        match value {
            "A1" => Some(CefrLevel::A1),
            "A2" => Some(CefrLevel::A2),
            "B1" => Some(CefrLevel::B1),
            "B2" => Some(CefrLevel::B2),
            "C1" => Some(CefrLevel::C1),
            _ => None,
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted overall score: grammar 30% + listening 30% + pronunciation 40%,
/// rounded half-up. Inputs are expected in [0,100]; range enforcement happens
/// in the validation layer, not here.
pub fn calculate_overall_score(grammar: f64, listening: f64, pronunciation: f64) -> i64 {
    (grammar * 0.3 + listening * 0.3 + pronunciation * 0.4).round() as i64
}

// CEFR thresholds: 0-20=A1, 21-40=A2, 41-60=B1, 61-80=B2, 81-100=C1.
// Boundary values belong to the lower band.
pub fn score_to_level(score: i64) -> CefrLevel {
    if score <= 20 {
        CefrLevel::A1
    } else if score <= 40 {
        CefrLevel::A2
    } else if score <= 60 {
        CefrLevel::B1
    } else if score <= 80 {
        CefrLevel::B2
    } else {
        CefrLevel::C1
    }
}

/// Strength tags in fixed order: grammar, listening, pronunciation.
pub fn derive_strengths(grammar: f64, listening: f64, pronunciation: f64) -> Vec<String> {
    let mut strengths = Vec::new();
    if grammar >= STRENGTH_THRESHOLD {
        strengths.push("Gramática sólida".to_string());
    }
    if listening >= STRENGTH_THRESHOLD {
        strengths.push("Boa compreensão auditiva".to_string());
    }
    if pronunciation >= STRENGTH_THRESHOLD {
        strengths.push("Boa pronúncia".to_string());
    }
    strengths
}

/// Weakness tags in fixed order: grammar, listening, pronunciation. Scores in
/// [50,70) land in neither list.
pub fn derive_weaknesses(grammar: f64, listening: f64, pronunciation: f64) -> Vec<String> {
    let mut weaknesses = Vec::new();
    if grammar < WEAKNESS_THRESHOLD {
        weaknesses.push("Gramática precisa de atenção".to_string());
    }
    if listening < WEAKNESS_THRESHOLD {
        weaknesses.push("Compreensão auditiva precisa de prática".to_string());
    }
    if pronunciation < WEAKNESS_THRESHOLD {
        weaknesses.push("Pronúncia precisa de atenção".to_string());
    }
    weaknesses
}
