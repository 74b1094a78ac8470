//! Error kinds surfaced to callers of the booking core.
//!
//! Infrastructure crates translate their transport errors into
//! [`DomainError::StoreUnavailable`] when a call could not complete, and
//! into [`DomainError::Internal`] for ambiguous failures after a write was
//! attempted. The HTTP layer maps each variant onto a status code.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Caller-facing error kinds.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed static validation; returned immediately.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"journey"`.
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// No availability to satisfy the request.
    #[error("insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats {
        /// Seats the caller asked for (per leg).
        requested: u32,
        /// Seats actually free on the most constrained leg.
        available: u32,
    },

    /// A concurrent booker won; the caller may retry.
    #[error("seats were taken by a concurrent booking")]
    SeatsRaceLost,

    /// Lock store, relational store, or bus is unreachable; retry after backoff.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// All other unexpected conditions; logged with a correlation id.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Build a [`DomainError::NotFound`] for an entity kind and id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same request and expect it to succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SeatsRaceLost | Self::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_entity_and_id() {
        let err = DomainError::not_found("booking", "b-42");
        assert_eq!(err.to_string(), "booking b-42 not found");
    }

    #[test]
    fn race_lost_is_retryable_but_validation_is_not() {
        assert!(DomainError::SeatsRaceLost.is_retryable());
        assert!(DomainError::StoreUnavailable("down".into()).is_retryable());
        assert!(!DomainError::Validation("bad".into()).is_retryable());
        assert!(!DomainError::Internal("boom".into()).is_retryable());
    }
}
