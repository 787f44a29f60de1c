use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Submission not found: {0}")]
    SubmissionNotFound(Uuid),

    #[error("Flag {flag_id} not found on submission {submission_id}")]
    FlagNotFound { submission_id: Uuid, flag_id: Uuid },

    #[error("Invalid document type: {provided}. Accepted: {accepted}")]
    InvalidDocumentType { provided: String, accepted: String },

    #[error("Detector {detector} failed: {message}")]
    DetectorFailure { detector: String, message: String },

    #[error("Detector {detector} timed out after {timeout_ms}ms")]
    DetectorTimeout { detector: String, timeout_ms: u64 },

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModerationError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ModerationError::SubmissionNotFound(_) | ModerationError::FlagNotFound { .. }
        )
    }

    fn error_code(&self) -> &'static str {
        match self {
            ModerationError::SubmissionNotFound(_) => "SUBMISSION_NOT_FOUND",
            ModerationError::FlagNotFound { .. } => "FLAG_NOT_FOUND",
            ModerationError::InvalidDocumentType { .. } => "INVALID_DOCUMENT_TYPE",
            ModerationError::DetectorFailure { .. } => "DETECTOR_FAILURE",
            ModerationError::DetectorTimeout { .. } => "DETECTOR_TIMEOUT",
            ModerationError::Classifier(_) => "CLASSIFIER_ERROR",
            ModerationError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            ModerationError::Validation(_) | ModerationError::InvalidInput(_) => {
                "VALIDATION_ERROR"
            }
            ModerationError::Config(_) => "CONFIGURATION_ERROR",
            ModerationError::Io(_) => "IO_ERROR",
            ModerationError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// JSON body returned for failed API calls
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub code: &'static str,
}

impl ResponseError for ModerationError {
    fn status_code(&self) -> StatusCode {
        match self {
            ModerationError::SubmissionNotFound(_) | ModerationError::FlagNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ModerationError::InvalidDocumentType { .. }
            | ModerationError::Validation(_)
            | ModerationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ModerationError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            ModerationError::DetectorFailure { .. }
            | ModerationError::DetectorTimeout { .. }
            | ModerationError::Classifier(_)
            | ModerationError::Config(_)
            | ModerationError::Io(_)
            | ModerationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.to_string(),
            status: status.as_u16(),
            code: self.error_code(),
        })
    }
}

pub type Result<T> = std::result::Result<T, ModerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ModerationError::SubmissionNotFound(Uuid::new_v4()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ModerationError::InvalidDocumentType {
                provided: "library_card".to_string(),
                accepted: "passport".to_string(),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ModerationError::InvalidStatusTransition {
                from: "approved".to_string(),
                to: "appealed".to_string(),
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ModerationError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_detection() {
        let err = ModerationError::FlagNotFound {
            submission_id: Uuid::new_v4(),
            flag_id: Uuid::new_v4(),
        };
        assert!(err.is_not_found());
        assert!(!ModerationError::Config("bad".to_string()).is_not_found());
    }
}
