//! Unified error types for the ratings API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core rating and aggregate errors
//! - `AppError`: Application layer errors (wraps domain errors for HTTP responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Domain layer errors - rating bookkeeping and storage errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Rating {value} is outside the valid range {min}..={max}")]
    InvalidValue { value: i32, min: i32, max: i32 },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency failure; the whole mutation may be retried.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The sum/count invariant was observed broken. Never retried.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Only storage conflicts are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Domain(e @ DomainError::InvalidValue { .. }) => (
                StatusCode::BAD_REQUEST,
                "Invalid rating",
                Some(e.to_string()),
            ),
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::UnknownEntity(id)) => (
                StatusCode::NOT_FOUND,
                "Unknown entity",
                Some(id.clone()),
            ),
            AppError::Domain(DomainError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "Not found", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Conflict(msg)) => {
                tracing::warn!("Conflict surfaced after retries: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Temporarily unavailable, retry later",
                    None,
                )
            }
            AppError::Domain(DomainError::InternalInconsistency(_)) => {
                // Alerted where it was detected
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Domain(DomainError::Database(msg)) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(DomainError::Conflict("serialization failure".into()).is_retryable());
        assert!(!DomainError::NotFound("x".into()).is_retryable());
        assert!(!DomainError::UnknownEntity("x".into()).is_retryable());
        assert!(!DomainError::InternalInconsistency("x".into()).is_retryable());
        assert!(!DomainError::Database("x".into()).is_retryable());
    }

    #[test]
    fn status_codes() {
        let cases = [
            (
                AppError::from(DomainError::InvalidValue {
                    value: 9,
                    min: 1,
                    max: 5,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(DomainError::UnknownEntity("42".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(DomainError::NotFound("rating".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(DomainError::Conflict("busy".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::from(DomainError::InternalInconsistency("count < 0".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::BadRequest("empty user_id".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn invalid_value_message_names_range() {
        let err = DomainError::InvalidValue {
            value: 0,
            min: 1,
            max: 5,
        };
        assert_eq!(err.to_string(), "Rating 0 is outside the valid range 1..=5");
    }
}
