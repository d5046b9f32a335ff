//! Client for the external session-evaluation model.
//!
//! Mock mode returns a canned evaluation so the rest of the pipeline can be
//! exercised without network access; real mode posts to the generative API
//! and hands back the raw candidate text for parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::EvalConfig;
use crate::scoring::CefrLevel;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("evaluation is disabled")]
    Disabled,
    #[error("evaluation api error: status={status}")]
    Api { status: u16, body: String },
    #[error("evaluation network error: {0}")]
    Network(String),
    #[error("evaluation response unparseable: {0}")]
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDimensions {
    pub pronunciation: i64,
    pub fluency: i64,
    pub comprehension: i64,
    pub grammar: i64,
    pub vocabulary: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextLessonHint {
    pub phase: String,
    pub instruction_pt_br: String,
    pub prompt_es_py: String,
}

/// Typed shape the model must return. Anything that fails to deserialize or
/// lands outside the documented ranges is an upstream failure, not ours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvaluation {
    pub estimated_level: CefrLevel,
    pub confidence: f64,
    pub dimensions: EvaluationDimensions,
    pub strengths: Vec<String>,
    pub priority_focus: Vec<String>,
    pub next_lesson: NextLessonHint,
}

const VALID_PHASES: [&str; 5] = [
    "listening",
    "reading",
    "pronunciation",
    "translation",
    "conversation",
];

/// Range/enum checks on a decoded evaluation.
pub fn validate_evaluation(evaluation: &SessionEvaluation) -> Result<(), String> {
    if !(0.0..=1.0).contains(&evaluation.confidence) {
        return Err("confidence must be within [0,1]".to_string());
    }
    let dims = &evaluation.dimensions;
    for (name, value) in [
        ("pronunciation", dims.pronunciation),
        ("fluency", dims.fluency),
        ("comprehension", dims.comprehension),
        ("grammar", dims.grammar),
        ("vocabulary", dims.vocabulary),
    ] {
        if !(0..=100).contains(&value) {
            return Err(format!("dimension {name} must be within [0,100]"));
        }
    }
    if evaluation.strengths.is_empty() || evaluation.strengths.len() > 5 {
        return Err("strengths must have 1-5 entries".to_string());
    }
    if evaluation.priority_focus.is_empty() || evaluation.priority_focus.len() > 5 {
        return Err("priorityFocus must have 1-5 entries".to_string());
    }
    if !VALID_PHASES.contains(&evaluation.next_lesson.phase.as_str()) {
        return Err(format!(
            "unknown next lesson phase: {}",
            evaluation.next_lesson.phase
        ));
    }
    Ok(())
}

/// Pull the first candidate's text out of a generative-API response body.
pub fn extract_candidate_text(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// Models wrap JSON in markdown fences more often than not.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Decode and range-check the model's raw text output.
pub fn parse_evaluation(raw: &str) -> Result<SessionEvaluation, EvalError> {
    let cleaned = strip_code_fences(raw);
    let evaluation: SessionEvaluation = serde_json::from_str(&cleaned)
        .map_err(|error| EvalError::Unparseable(error.to_string()))?;
    validate_evaluation(&evaluation).map_err(EvalError::Unparseable)?;
    Ok(evaluation)
}

#[derive(Debug, Clone)]
pub struct SessionEvaluator {
    config: EvalConfig,
    client: reqwest::Client,
}

impl SessionEvaluator {
    pub fn new(config: &EvalConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Validate evaluator configuration at startup. Panics when real mode is
    /// enabled without an API key.
    pub fn validate_config(config: &EvalConfig) {
        if config.enabled && !config.mock && config.api_key.is_empty() {
            panic!(
                "Invalid evaluation configuration: enabled=true and mock=false \
                 require EVAL_API_KEY. Set EVAL_MOCK=true or EVAL_ENABLED=false."
            );
        }
    }

    /// Send the prompt and return the model's raw text answer.
    pub async fn evaluate(&self, prompt: &str) -> Result<String, EvalError> {
        if !self.config.enabled {
            return Err(EvalError::Disabled);
        }
        if self.config.mock {
            return Ok(mock_evaluation_text());
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_url, self.config.model, self.config.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.2, "maxOutputTokens": 2048 },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|error| EvalError::Network(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|error| EvalError::Unparseable(error.to_string()))?;
        extract_candidate_text(&json)
            .ok_or_else(|| EvalError::Unparseable("response carried no candidate text".to_string()))
    }
}

fn mock_evaluation_text() -> String {
    serde_json::json!({
        "estimatedLevel": "A2",
        "confidence": 0.75,
        "dimensions": {
            "pronunciation": 62,
            "fluency": 58,
            "comprehension": 71,
            "grammar": 65,
            "vocabulary": 60
        },
        "strengths": ["Compreensão de instruções simples"],
        "priorityFocus": ["Pronúncia do rr vibrante"],
        "nextLesson": {
            "phase": "pronunciation",
            "instructionPtBr": "Pratique o rr em palavras curtas.",
            "promptEsPy": "Repetí conmigo: perro, carro, tierra."
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, mock: bool) -> EvalConfig {
        EvalConfig {
            enabled,
            mock,
            api_url: "https://example.invalid".to_string(),
            api_key: "k".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn disabled_mode_returns_error() {
        let evaluator = SessionEvaluator::new(&config(false, true));
        assert!(matches!(
            evaluator.evaluate("prompt").await,
            Err(EvalError::Disabled)
        ));
    }

    #[tokio::test]
    async fn mock_mode_returns_parseable_evaluation() {
        let evaluator = SessionEvaluator::new(&config(true, true));
        let raw = evaluator.evaluate("prompt").await.unwrap();
        let evaluation = parse_evaluation(&raw).unwrap();
        assert_eq!(evaluation.estimated_level, CefrLevel::A2);
        assert_eq!(evaluation.next_lesson.phase, "pronunciation");
    }

    #[test]
    fn candidate_text_extraction_walks_the_response_shape() {
        let body = serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "hola" }] } }
            ]
        });
        assert_eq!(extract_candidate_text(&body).as_deref(), Some("hola"));
        assert!(extract_candidate_text(&serde_json::json!({})).is_none());
    }

    #[test]
    fn fenced_json_still_parses() {
        let fenced = format!("```json\n{}\n```", mock_evaluation_text());
        assert!(parse_evaluation(&fenced).is_ok());
    }

    #[test]
    fn out_of_range_values_are_unparseable() {
        let mut evaluation = parse_evaluation(&mock_evaluation_text()).unwrap();
        evaluation.confidence = 1.5;
        let raw = serde_json::to_string(&evaluation).unwrap();
        assert!(matches!(
            parse_evaluation(&raw),
            Err(EvalError::Unparseable(_))
        ));

        evaluation.confidence = 0.5;
        evaluation.dimensions.grammar = 101;
        let raw = serde_json::to_string(&evaluation).unwrap();
        assert!(parse_evaluation(&raw).is_err());

        evaluation.dimensions.grammar = 80;
        evaluation.next_lesson.phase = "singing".to_string();
        let raw = serde_json::to_string(&evaluation).unwrap();
        assert!(parse_evaluation(&raw).is_err());
    }

    #[test]
    fn garbage_text_is_unparseable() {
        assert!(matches!(
            parse_evaluation("not json at all"),
            Err(EvalError::Unparseable(_))
        ));
    }

    #[test]
    #[should_panic(expected = "EVAL_API_KEY")]
    fn real_mode_without_key_is_rejected_at_startup() {
        let mut cfg = config(true, false);
        cfg.api_key = String::new();
        SessionEvaluator::validate_config(&cfg);
    }
}
