use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::CefrLevel;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Initial,
    Retest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStatus {
    InProgress,
    Completed,
}

/// A diagnostic assessment session: three raw area scores plus the derived
/// result written once at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub status: DiagnosticStatus,
    pub grammar_score: Option<f64>,
    pub listening_score: Option<f64>,
    pub pronunciation_score: Option<f64>,
    #[serde(default)]
    pub phonemes_to_work: Vec<String>,
    pub overall_score: Option<i64>,
    pub level_assigned: Option<CefrLevel>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub previous_diagnostic_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Store {
    pub fn put_diagnostic(&self, user_id: &str, diagnostic: &Diagnostic) -> Result<(), StoreError> {
        let key = keys::diagnostic_key(user_id, &diagnostic.id);
        self.diagnostics
            .insert(key.as_bytes(), Self::serialize(diagnostic)?)?;
        Ok(())
    }

    pub fn get_diagnostic(
        &self,
        user_id: &str,
        diagnostic_id: &str,
    ) -> Result<Option<Diagnostic>, StoreError> {
        let key = keys::diagnostic_key(user_id, diagnostic_id);
        match self.diagnostics.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_round_trips() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("diag.sled").to_str().unwrap()).unwrap();

        let diagnostic = Diagnostic {
            id: "d1".to_string(),
            kind: DiagnosticKind::Initial,
            status: DiagnosticStatus::InProgress,
            grammar_score: Some(80.0),
            listening_score: None,
            pronunciation_score: Some(70.0),
            phonemes_to_work: vec!["rr".to_string()],
            overall_score: None,
            level_assigned: None,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            previous_diagnostic_id: None,
            started_at: Utc::now(),
            completed_at: None,
        };
        store.put_diagnostic("u1", &diagnostic).unwrap();

        let loaded = store.get_diagnostic("u1", "d1").unwrap().expect("diagnostic");
        assert_eq!(loaded.grammar_score, Some(80.0));
        assert_eq!(loaded.status, DiagnosticStatus::InProgress);
        assert!(store.get_diagnostic("u1", "d2").unwrap().is_none());
        assert!(store.get_diagnostic("u2", "d1").unwrap().is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DiagnosticStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
