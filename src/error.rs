use thiserror::Error;

use crate::store::StoreError;

/// Broad failure category, mirroring the condition names callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    FailedPrecondition,
    InvalidArgument,
    ResourceExhausted,
    Internal,
}

/// Caller-visible failure raised by the service layer.
///
/// `code` is a stable snake_case identifier; `message` is free-form and may
/// change. Domain-logic functions never construct these -- only the
/// orchestration layer does.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn not_found(code: &'static str, message: &str) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code,
            message: message.to_string(),
        }
    }

    pub fn failed_precondition(code: &'static str, message: &str) -> Self {
        Self {
            kind: ErrorKind::FailedPrecondition,
            code,
            message: message.to_string(),
        }
    }

    pub fn invalid_argument(code: &'static str, message: &str) -> Self {
        Self {
            kind: ErrorKind::InvalidArgument,
            code,
            message: message.to_string(),
        }
    }

    pub fn resource_exhausted(code: &'static str, message: &str) -> Self {
        Self {
            kind: ErrorKind::ResourceExhausted,
            code,
            message: message.to_string(),
        }
    }

    pub fn internal(code: &'static str, message: &str) -> Self {
        Self {
            kind: ErrorKind::Internal,
            code,
            message: message.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        ServiceError::internal("store_error", &value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = ServiceError::not_found("session_not_found", "Session not found.");
        assert_eq!(err.to_string(), "session_not_found: Session not found.");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn store_errors_map_to_internal() {
        let err: ServiceError = StoreError::Serialization(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        )
        .into();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.code, "store_error");
    }
}
