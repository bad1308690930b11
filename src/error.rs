//! Error taxonomy shared by the shortening pipeline and its HTTP mapping.
//!
//! The core returns [`AppError`] from every fallible operation. Validation
//! failures are reported immediately, storage failures carry the operation
//! that produced them, and the HTTP layer turns each kind into a status code
//! via [`IntoResponse`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::utils::db_error::is_unique_violation_on_code;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors produced by the URL shortening pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed, relative, or non-http(s) input to shorten.
    #[error("invalid URL")]
    InvalidUrl,

    /// Short code with the wrong length or characters outside the alphabet.
    #[error("invalid short code")]
    InvalidShortCode,

    /// Well-formed short code with no matching record.
    #[error("url not found")]
    UrlNotFound,

    /// The store rejected a record because its short code is already in use.
    #[error("short code already taken")]
    ShortCodeTaken,

    /// Every generated candidate collided with an existing code.
    ///
    /// This is a capacity problem: the configured code length is too short
    /// for the number of stored records.
    #[error("failed to generate unique short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },

    /// Request payload failed field validation.
    #[error("request validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Store or other infrastructure failure.
    #[error("{context}: {message}")]
    Persistence { context: String, message: String },
}

impl AppError {
    /// Builds a persistence error for the given operation.
    pub fn persistence(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Prefixes a persistence error with the caller's operation.
    ///
    /// Every other kind is returned unchanged, so callers can wrap store
    /// results without masking `ShortCodeTaken` or validation errors.
    pub fn context(self, context: impl Into<String>) -> Self {
        match self {
            Self::Persistence {
                context: inner,
                message,
            } => Self::Persistence {
                context: format!("{}: {}", context.into(), inner),
                message,
            },
            other => other,
        }
    }

    /// Returns the HTTP status for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl | Self::InvalidShortCode | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UrlNotFound => StatusCode::NOT_FOUND,
            Self::ShortCodeTaken | Self::CodeSpaceExhausted { .. } | Self::Persistence { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converts the error into the JSON payload sent to clients.
    ///
    /// Persistence details are not exposed; they are logged instead.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            Self::InvalidUrl => (
                "invalid_url",
                "URL must be an absolute http or https URL".to_string(),
                json!({}),
            ),
            Self::InvalidShortCode => ("invalid_short_code", self.to_string(), json!({})),
            Self::UrlNotFound => ("not_found", "Short link not found".to_string(), json!({})),
            Self::ShortCodeTaken => ("short_code_taken", self.to_string(), json!({})),
            Self::CodeSpaceExhausted { attempts } => (
                "code_space_exhausted",
                "Failed to generate unique short code".to_string(),
                json!({ "attempts": attempts }),
            ),
            Self::Validation(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                json!({ "reason": errors.to_string() }),
            ),
            Self::Persistence { .. } => ("internal_error", "Storage error".to_string(), json!({})),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation_on_code(&e) {
            return AppError::ShortCodeTaken;
        }

        AppError::persistence("database error", e.to_string())
    }
}
