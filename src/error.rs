use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixiError {
    #[error("Failed to initialize OCR engine: {0}")]
    Initialization(String),

    #[error("Error extracting text: {0}")]
    Extraction(String),

    #[error("❌ API Error: {0}")]
    Model(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Please enter a question.")]
    EmptyQuestion,

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for PixiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            PixiError::Initialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR"),
            PixiError::Extraction(_) => (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_ERROR"),
            PixiError::Model(_) => (StatusCode::BAD_GATEWAY, "MODEL_ERROR"),
            PixiError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT"),
            PixiError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            PixiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            PixiError::EmptyQuestion => (StatusCode::BAD_REQUEST, "EMPTY_QUESTION"),
            PixiError::UnknownLanguage(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_LANGUAGE"),
            PixiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            PixiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_errors_carry_the_display_prefix() {
        let err = PixiError::Extraction("bad pixels".to_string());
        assert!(err.to_string().contains("Error extracting text:"));
        assert!(err.to_string().contains("bad pixels"));
    }

    #[test]
    fn model_errors_carry_the_display_prefix() {
        let err = PixiError::Model("connection refused".to_string());
        let rendered = err.to_string();
        assert!(rendered.contains("❌"));
        assert!(rendered.contains("Error"));
        assert!(rendered.contains("connection refused"));
    }

    #[test]
    fn empty_question_renders_the_warning_text() {
        assert_eq!(
            PixiError::EmptyQuestion.to_string(),
            "Please enter a question."
        );
    }
}
