use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Taxonomy
///
/// Only failures that originate in handlers are modeled here. The request
/// gate never surfaces errors through this enum: rate limiting, admin gating
/// and abuse detection are expressed as explicit decision values that the
/// gate converts into responses itself.
///
/// - `Validation` - bad input shape, surfaced to the user, never logged as a
///   security event
/// - `CsrfRejected` - token missing, mismatched or expired; forbidden
/// - `InvalidCredentials` - login against an unknown account
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("CSRF token rejected")]
    CsrfRejected,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Client-caused failures are routine; only server-side faults get an
        // error-level log entry.
        match &self {
            AppError::Internal(_) | AppError::ConfigError(_) => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }

        let (status, error_type, message, violations) = match self {
            AppError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                "One or more fields failed validation.".to_string(),
                Some(violations),
            ),
            AppError::CsrfRejected => (
                StatusCode::FORBIDDEN,
                "csrf_rejected",
                "Request could not be verified. Refresh your session and try again.".to_string(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Email or password is incorrect.".to_string(),
                None,
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),

            // Internal errors - never expose internal details to clients
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred. Please try again later.".to_string(),
                None,
            ),
            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Service configuration error.".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            violations,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
