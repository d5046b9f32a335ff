//! Post-session adaptive evaluation.
//!
//! The client reports the transcript and correction log; the server refuses
//! anything that disagrees with the metrics it recorded at completion time,
//! then asks the evaluation model for a level estimate and next-lesson hint
//! and merges the result onto the session.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::scoring::CefrLevel;
use crate::services::evaluator::{parse_evaluation, EvalError, SessionEvaluation, SessionEvaluator};
use crate::store::operations::sessions::SessionStatus;
use crate::store::Store;
use crate::validation::{
    validate_count, validate_duration_ms, validate_id, validate_score, validate_text,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Tutor,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub phoneme: String,
    pub expected: String,
    pub heard: String,
    pub score: i64,
    pub attempt: u32,
    pub accepted: bool,
}

#[derive(Debug, Clone)]
pub struct EvaluateSessionInput {
    pub session_id: String,
    pub duration_ms: i64,
    pub overall_score: i64,
    pub messages: Vec<ChatTurn>,
    pub corrections: Vec<CorrectionReport>,
}

fn validate_input(input: &EvaluateSessionInput) -> Result<(), String> {
    validate_id(&input.session_id, "sessionId")?;
    validate_duration_ms(input.duration_ms)?;
    validate_score(input.overall_score, "overallScore")?;
    validate_count(input.messages.len() as u32, 120, "messages")?;
    validate_count(input.corrections.len() as u32, 600, "corrections")?;
    for turn in &input.messages {
        validate_text(&turn.text, 4000, "message text")?;
    }
    for correction in &input.corrections {
        validate_text(&correction.phoneme, 40, "phoneme")?;
        validate_score(correction.score, "correction score")?;
    }
    Ok(())
}

fn build_prompt(current_level: CefrLevel, input: &EvaluateSessionInput) -> String {
    let payload = serde_json::json!({
        "currentLevel": current_level,
        "durationMs": input.duration_ms,
        "overallScore": input.overall_score,
        "messages": input.messages,
        "corrections": input.corrections,
    });
    format!(
        "Você é um avaliador pedagógico de Espanhol Paraguaio para brasileiros. \
         Analise a sessão e responda APENAS com o JSON da avaliação \
         (estimatedLevel, confidence, dimensions, strengths, priorityFocus, nextLesson).\n\
         Entrada:\n{payload}"
    )
}

pub async fn evaluate_session(
    store: &Store,
    clock: &dyn Clock,
    evaluator: &SessionEvaluator,
    user_id: &str,
    input: &EvaluateSessionInput,
) -> Result<SessionEvaluation, ServiceError> {
    validate_input(input)
        .map_err(|message| ServiceError::invalid_argument("invalid_input", &message))?;

    let Some(mut session) = store.get_session(user_id, &input.session_id)? else {
        return Err(ServiceError::not_found(
            "session_not_found",
            "Session not found.",
        ));
    };
    if session.status != SessionStatus::Completed {
        return Err(ServiceError::failed_precondition(
            "session_not_completed",
            "Session must be completed before evaluation.",
        ));
    }

    // Client-reported metrics must agree with what completion recorded;
    // anything else is treated as tampering and rejected outright.
    if let (Some(duration_ms), Some(overall_score)) = (session.duration_ms, session.overall_score) {
        if duration_ms != input.duration_ms || overall_score != input.overall_score as f64 {
            return Err(ServiceError::invalid_argument(
                "session_metrics_mismatch",
                "Session metrics mismatch.",
            ));
        }
    }
    if let Some(message_count) = session.message_count {
        let user_messages = input
            .messages
            .iter()
            .filter(|turn| turn.role == ChatRole::User)
            .count() as u32;
        if message_count != user_messages {
            return Err(ServiceError::invalid_argument(
                "message_count_mismatch",
                "Message count mismatch.",
            ));
        }
    }
    if let Some(total_corrections) = session.total_corrections {
        if total_corrections != input.corrections.len() as u32 {
            return Err(ServiceError::invalid_argument(
                "corrections_count_mismatch",
                "Corrections count mismatch.",
            ));
        }
    }

    let current_level = store
        .get_user_profile(user_id)?
        .and_then(|profile| profile.level)
        .unwrap_or(CefrLevel::A1);

    let prompt = build_prompt(current_level, input);
    let raw = match evaluator.evaluate(&prompt).await {
        Ok(raw) => raw,
        Err(EvalError::Api { status, body }) => {
            tracing::error!(status, body = %body, "Evaluation API returned an error");
            return Err(ServiceError::internal(
                "evaluation_failed",
                &format!("Evaluation API returned {status}"),
            ));
        }
        Err(error) => {
            tracing::error!(error = %error, "Session evaluation failed");
            return Err(ServiceError::internal(
                "evaluation_failed",
                "Failed to evaluate session.",
            ));
        }
    };

    let evaluation = match parse_evaluation(&raw) {
        Ok(evaluation) => evaluation,
        Err(error) => {
            tracing::error!(error = %error, raw = %raw, "Evaluation response rejected");
            return Err(ServiceError::internal(
                "evaluation_failed",
                "Failed to evaluate session.",
            ));
        }
    };

    session.adaptive_evaluation = Some(serde_json::to_value(&evaluation).map_err(|error| {
        ServiceError::internal("evaluation_failed", &error.to_string())
    })?);
    session.updated_at = clock.now();
    store.put_session(&session)?;

    Ok(evaluation)
}
