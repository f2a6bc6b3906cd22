use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::form::session::SessionError;
use crate::form::work_history::WorkHistoryError;
use crate::intake::analysis::AnalysisError;
use crate::intake::extract::ExtractError;
use crate::record::store::StoreError;

const EXTRACTION_MESSAGE: &str = "Failed to process the PDF. Please try again.";
const LLM_MESSAGE: &str = "An AI processing error occurred. Please try again.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("LLM error: {0}")]
    Llm(String),
}

impl AppError {
    /// The message shown to the user. Server-side failures get a generic
    /// message; their details only go to the log.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::InvalidFile(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Extraction(_) => EXTRACTION_MESSAGE.to_string(),
            AppError::Llm(_) => LLM_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::InvalidFile(_) => (StatusCode::BAD_REQUEST, "INVALID_FILE"),
            AppError::Extraction(detail) => {
                tracing::error!("Extraction error: {detail}");
                (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_FAILED")
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Llm(detail) => {
                tracing::error!("LLM error: {detail}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        if err.is_invalid_file() {
            AppError::InvalidFile(err.to_string())
        } else {
            AppError::Extraction(err.to_string())
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::Llm(format!("Failed to analyze resume: {err}"))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Conflict(format!(
            "The resume changed while you were editing ({err}). Reload the form and try again."
        ))
    }
}

impl From<WorkHistoryError> for AppError {
    fn from(err: WorkHistoryError) -> Self {
        match err {
            WorkHistoryError::NotFound(_) => AppError::NotFound(err.to_string()),
            WorkHistoryError::InvalidValue { .. } => AppError::Validation(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Closed => AppError::Conflict(err.to_string()),
            SessionError::WorkHistory(inner) => inner.into(),
            SessionError::SectionNotEditable(_)
            | SessionError::WorkHistoryField(_)
            | SessionError::InsideList { .. }
            | SessionError::InvalidNumber { .. }
            | SessionError::InputMismatch { .. } => AppError::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_errors_split_by_stage() {
        assert!(matches!(AppError::from(ExtractError::NotPdf), AppError::InvalidFile(_)));
        assert!(matches!(AppError::from(ExtractError::NoText), AppError::Extraction(_)));
    }

    #[test]
    fn test_extraction_message_is_generic() {
        let err = AppError::from(ExtractError::Failed("xref table broken".into()));
        assert_eq!(err.user_message(), EXTRACTION_MESSAGE);
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidFile("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Extraction("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::from(SessionError::Closed), StatusCode::CONFLICT),
            (AppError::Llm("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_session_work_history_errors_map_through() {
        let err = AppError::from(SessionError::WorkHistory(WorkHistoryError::NotFound("a".into())));
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
