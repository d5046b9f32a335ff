//! Diagnostic completion: turn the three raw area scores into the overall
//! score, CEFR level and qualitative tags, then merge the result into the
//! diagnostic record and the user profile.

use serde::Serialize;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::scoring::{
    calculate_overall_score, derive_strengths, derive_weaknesses, score_to_level, CefrLevel,
};
use crate::services::adapter;
use crate::store::operations::diagnostics::DiagnosticStatus;
use crate::store::operations::users::UserProfile;
use crate::store::Store;
use crate::validation::validate_id;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticOutcome {
    pub overall_score: i64,
    pub level: CefrLevel,
    pub grammar_score: f64,
    pub listening_score: f64,
    pub pronunciation_score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub phonemes_to_work: Vec<String>,
}

pub fn calculate_diagnostic_result(
    store: &Store,
    clock: &dyn Clock,
    user_id: &str,
    diagnostic_id: &str,
) -> Result<DiagnosticOutcome, ServiceError> {
    validate_id(diagnostic_id, "diagnosticId")
        .map_err(|message| ServiceError::invalid_argument("invalid_diagnostic_id", &message))?;

    let Some(mut diagnostic) = store.get_diagnostic(user_id, diagnostic_id)? else {
        return Err(ServiceError::not_found(
            "diagnostic_not_found",
            "Diagnostic session not found.",
        ));
    };

    // Missing area scores count as zero rather than failing the calculation.
    let grammar = diagnostic.grammar_score.unwrap_or(0.0);
    let listening = diagnostic.listening_score.unwrap_or(0.0);
    let pronunciation = diagnostic.pronunciation_score.unwrap_or(0.0);

    let overall_score = calculate_overall_score(grammar, listening, pronunciation);
    let level = score_to_level(overall_score);
    let strengths = derive_strengths(grammar, listening, pronunciation);
    let weaknesses = derive_weaknesses(grammar, listening, pronunciation);
    let completed_at = clock.now();

    diagnostic.overall_score = Some(overall_score);
    diagnostic.level_assigned = Some(level);
    diagnostic.strengths = strengths.clone();
    diagnostic.weaknesses = weaknesses.clone();
    diagnostic.status = DiagnosticStatus::Completed;
    diagnostic.completed_at = Some(completed_at);
    store.put_diagnostic(user_id, &diagnostic)?;

    let mut profile = store
        .get_user_profile(user_id)?
        .unwrap_or_else(|| UserProfile::shell(user_id, completed_at));
    profile.level = Some(level);
    profile.level_score = Some(overall_score);
    profile.grammar_score = Some(grammar);
    profile.listening_score = Some(listening);
    profile.speaking_score = Some(pronunciation);
    profile.weak_phonemes = diagnostic.phonemes_to_work.clone();
    profile.diagnostic_completed = true;
    profile.last_diagnostic_date = Some(completed_at);
    profile.updated_at = completed_at;
    store.put_user_profile(&profile)?;

    // A new level re-centers the difficulty ladder.
    adapter::reset_on_diagnostic(store, clock, user_id, &diagnostic)?;

    Ok(DiagnosticOutcome {
        overall_score,
        level,
        grammar_score: grammar,
        listening_score: listening,
        pronunciation_score: pronunciation,
        strengths,
        weaknesses,
        phonemes_to_work: diagnostic.phonemes_to_work,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::clock::FixedClock;
    use crate::error::ErrorKind;
    use crate::store::operations::diagnostics::{Diagnostic, DiagnosticKind};

    use super::*;

    fn seed_diagnostic(store: &Store, grammar: f64, listening: f64, pronunciation: f64) {
        let diagnostic = Diagnostic {
            id: "d1".to_string(),
            kind: DiagnosticKind::Initial,
            status: DiagnosticStatus::InProgress,
            grammar_score: Some(grammar),
            listening_score: Some(listening),
            pronunciation_score: Some(pronunciation),
            phonemes_to_work: vec!["rr".to_string(), "ll".to_string()],
            overall_score: None,
            level_assigned: None,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            previous_diagnostic_id: None,
            started_at: Utc::now(),
            completed_at: None,
        };
        store.put_diagnostic("u1", &diagnostic).unwrap();
    }

    #[test]
    fn result_is_written_to_diagnostic_and_profile() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("diag_svc.sled").to_str().unwrap()).unwrap();
        let clock = FixedClock::at(Utc::now());
        // An established A1 user with a ladder position.
        let mut profile = UserProfile::shell("u1", clock.now());
        profile.level = Some(CefrLevel::A1);
        profile.current_difficulty =
            Some(crate::adapter::DifficultyMap::mid_for(CefrLevel::A1));
        store.put_user_profile(&profile).unwrap();
        seed_diagnostic(&store, 80.0, 60.0, 70.0);

        let outcome = calculate_diagnostic_result(&store, &clock, "u1", "d1").unwrap();
        assert_eq!(outcome.overall_score, 70);
        assert_eq!(outcome.level, CefrLevel::B2);
        assert_eq!(outcome.strengths, vec!["Gramática sólida".to_string()]);
        assert!(outcome.weaknesses.is_empty());

        let diagnostic = store.get_diagnostic("u1", "d1").unwrap().unwrap();
        assert_eq!(diagnostic.status, DiagnosticStatus::Completed);
        assert_eq!(diagnostic.overall_score, Some(70));

        let profile = store.get_user_profile("u1").unwrap().unwrap();
        assert_eq!(profile.level, Some(CefrLevel::B2));
        assert_eq!(profile.level_score, Some(70));
        assert!(profile.diagnostic_completed);
        assert_eq!(profile.weak_phonemes.len(), 2);
        // Level assignment re-centers the ladder at the mid rung.
        let difficulty = profile.current_difficulty.expect("difficulty");
        assert_eq!(difficulty.grammar.as_str(), "B2-mid");
    }

    #[test]
    fn missing_scores_default_to_zero() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("diag_zero.sled").to_str().unwrap()).unwrap();
        let clock = FixedClock::at(Utc::now());

        let diagnostic = Diagnostic {
            id: "d1".to_string(),
            kind: DiagnosticKind::Initial,
            status: DiagnosticStatus::InProgress,
            grammar_score: None,
            listening_score: None,
            pronunciation_score: None,
            phonemes_to_work: Vec::new(),
            overall_score: None,
            level_assigned: None,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            previous_diagnostic_id: None,
            started_at: Utc::now(),
            completed_at: None,
        };
        store.put_diagnostic("u1", &diagnostic).unwrap();

        let outcome = calculate_diagnostic_result(&store, &clock, "u1", "d1").unwrap();
        assert_eq!(outcome.overall_score, 0);
        assert_eq!(outcome.level, CefrLevel::A1);
        assert_eq!(outcome.weaknesses.len(), 3);
    }

    #[test]
    fn unknown_diagnostic_is_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("diag_missing.sled").to_str().unwrap()).unwrap();
        let clock = FixedClock::at(Utc::now());

        let err = calculate_diagnostic_result(&store, &clock, "u1", "d1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.code, "diagnostic_not_found");
    }
}
