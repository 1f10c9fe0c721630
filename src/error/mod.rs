// Error types for the phishlens service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// The one message shown to the user for any upstream or binding failure.
///
/// "Service down", "bad key", and "bad file format" deliberately collapse to
/// this single string; the distinction lives in the logs only.
pub const GENERIC_FAILURE: &str =
    "The analysis service could not process this request. Please try again.";

/// Message shown when a submission carries nothing analyzable.
pub const MISSING_INPUT: &str = "No analyzable content in the uploaded file.";

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("{}", MISSING_INPUT)]
    MissingInput,

    #[error("No quiz round is awaiting a guess")]
    NoOutstandingRound,

    #[error("A {0} call is already in progress for this session")]
    Busy(&'static str),

    #[error("Unknown session")]
    UnknownSession,

    #[error("Model API error: {0}")]
    Upstream(String),

    #[error("Unreadable model reply: {0}")]
    MalformedReply(String),

    #[error("Geolocation lookup failed: {0}")]
    Geo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert TriageError to HTTP responses for Axum
impl IntoResponse for TriageError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            TriageError::MissingInput | TriageError::NoOutstandingRound => {
                (StatusCode::BAD_REQUEST, "missing_input", self.to_string())
            }
            TriageError::Busy(_) => (StatusCode::CONFLICT, "busy", self.to_string()),
            TriageError::UnknownSession => {
                (StatusCode::NOT_FOUND, "unknown_session", self.to_string())
            }
            // All upstream and binding failures surface the same static text.
            TriageError::Upstream(_)
            | TriageError::MalformedReply(_)
            | TriageError::Geo(_)
            | TriageError::Http(_) => (
                StatusCode::BAD_GATEWAY,
                "analysis_error",
                GENERIC_FAILURE.to_string(),
            ),
            TriageError::Config(_) | TriageError::ConfigParsing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                self.to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                self.to_string(),
            ),
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
