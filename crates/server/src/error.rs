//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Propagation policy: validation and authorization failures short-circuit
//! before any external call; provider failures are caught, logged, and
//! surfaced with the provider's message. There are no automatic retries
//! anywhere in this pipeline - a transient failure is visible to the caller,
//! who may resubmit.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;
use crate::services::push::PushError;
use crate::validate::ValidationError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Email provider call failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Push transport failed before any delivery could be attempted.
    #[error("Push error: {0}")]
    Push(#[from] PushError),

    /// Malformed or out-of-bounds payload field.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Missing or invalid bearer credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Principal does not own the resource referenced in the payload.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Email(_) | Self::Push(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) | Self::Push(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Internal details stay out of the response body; provider messages
        // are passed through so a caller can tell email/push failures apart
        // from our own faults.
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Email(err) => err.to_string(),
            Self::Push(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Unauthorized(msg) | Self::Forbidden(msg) | Self::NotFound(msg) => msg.clone(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("review-123".to_string());
        assert_eq!(err.to_string(), "Not found: review-123");

        let err = AppError::Forbidden("userId does not match caller".to_string());
        assert_eq!(err.to_string(), "Forbidden: userId does not match caller");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation(ValidationError {
                field: "quantity",
                message: "must be between 1 and 100".to_string(),
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("missing bearer token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("not your cart".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_provider_error_is_500() {
        let err = AppError::Email(EmailError::Api {
            status: 422,
            message: "invalid from address".to_string(),
        });
        assert_eq!(get_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
