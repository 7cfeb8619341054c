use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Defects in a policy table. Raised at load time, never during evaluation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Rule for {0} has an empty allowed_values set")]
    EmptyAllowedValues(String),

    #[error("Rule has an empty header name")]
    EmptyHeaderName,

    #[error("Duplicate rule for header {0}")]
    DuplicateHeader(String),

    #[error("Invalid policy document: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum PagewatchError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No headers cached for tab {0}")]
    TabNotFound(u64),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for PagewatchError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            PagewatchError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            PagewatchError::TabNotFound(id) => (
                StatusCode::NOT_FOUND,
                "tab_not_found",
                format!("No headers cached for tab {}", id),
            ),
        };

        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::Parse(err.to_string())
    }
}
