//! Error types for HTTP handlers.
//!
//! [`AppError`] bridges [`DomainError`] kinds to HTTP responses through
//! Axum's `IntoResponse`. The mapping is part of the public contract:
//! validation → 400, missing entities → 404, lost races → 409 (retryable),
//! no availability → 422, unreachable stores → 503.

use aerobook_core::DomainError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code.
    status: StatusCode,
    /// Error message (user-facing).
    message: String,
    /// Error code (for client error handling).
    code: &'static str,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "VALIDATION")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND",
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        match &error {
            DomainError::Validation(_) => {
                Self::new(StatusCode::BAD_REQUEST, error.to_string(), "VALIDATION")
            }
            DomainError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, error.to_string(), "NOT_FOUND")
            }
            DomainError::InsufficientSeats { .. } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                error.to_string(),
                "INSUFFICIENT_SEATS",
            ),
            DomainError::SeatsRaceLost => Self::new(
                StatusCode::CONFLICT,
                "seats were taken by a concurrent booking; retry".to_string(),
                "SEATS_RACE_LOST",
            ),
            DomainError::StoreUnavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "a backing store is unavailable; retry after backoff".to_string(),
                "STORE_UNAVAILABLE",
            ),
            DomainError::Internal(detail) => {
                // Log the detail with a correlation id; never leak it.
                let correlation_id = Uuid::new_v4();
                tracing::error!(%correlation_id, %detail, "Internal error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("internal error (correlation id {correlation_id})"),
                    "INTERNAL",
                )
            }
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                "Request failed"
            );
        }

        let body = ErrorResponse {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_kinds_map_to_contract_statuses() {
        let cases = [
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                DomainError::not_found("booking", "b1"),
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::InsufficientSeats {
                    requested: 2,
                    available: 1,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (DomainError::SeatsRaceLost, StatusCode::CONFLICT),
            (
                DomainError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                DomainError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (domain, status) in cases {
            let app: AppError = domain.into();
            assert_eq!(app.status(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let app: AppError = DomainError::Internal("connection string secret".into()).into();
        assert!(!app.to_string().contains("secret"));
        assert_eq!(app.code(), "INTERNAL");
    }
}
