//! Unified error handling.
//!
//! All route handlers return `Result<T, AppError>`. The client-facing body
//! is JSON: a human-readable `message`, a numeric `code` matching the HTTP
//! status, and for validation failures a list of per-field `errors`.
//!
//! Authorization and user-lookup failures collapse into one message so a
//! caller can never probe which accounts exist.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::payments::PaymentError;
use crate::store::StoreError;

/// One validation failure, tied to an input field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    /// The offending input field.
    pub field: String,
    /// What was wrong with it.
    pub message: String,
}

impl FieldError {
    /// Convenience constructor.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid identity, ownership mismatch, or a bad reset token.
    #[error("Not authorized")]
    Unauthorized,

    /// Entity lookup miss.
    #[error("{0}")]
    NotFound(String),

    /// Input validation failed; carries per-field messages.
    #[error("Invalid input")]
    InvalidInput(Vec<FieldError>),

    /// Valid request against invalid business state (empty cart, self-purchase).
    #[error("{0}")]
    InvalidOperation(String),

    /// Payment processor failure.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] PaymentError),

    /// Storage failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Unexpected infrastructure failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-field validation failure.
    #[must_use]
    pub fn invalid_field(field: &str, message: &str) -> Self {
        Self::InvalidInput(vec![FieldError::new(field, message)])
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Store(_) | Self::Internal(_) | Self::Gateway(_)) {
            tracing::error!(error = %self, "request error");
        }

        let status = self.status();

        // Internal details stay out of the response body
        let message = match &self {
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Gateway(_) => "Payment processing failed".to_owned(),
            other => other.to_string(),
        };

        let errors = match self {
            Self::InvalidInput(errors) => errors,
            _ => Vec::new(),
        };

        let body = ErrorBody {
            message,
            code: status.as_u16(),
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
