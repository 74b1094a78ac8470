//! `PostgreSQL` stores for the Aerobook flight booking backend.
//!
//! The relational store is the durable source of truth for flights, seats,
//! journeys, and bookings. Each store wraps a shared [`PgPool`] and exposes
//! async operations returning [`aerobook_core::DomainError`] kinds:
//! connectivity failures surface as `STORE_UNAVAILABLE`, everything else
//! unexpected as `INTERNAL`.
//!
//! Schema lives under `migrations/` and is applied with
//! [`run_migrations`] at startup.

pub mod bookings;
pub mod flights;
pub mod journeys;
pub mod outbox;
pub mod seats;

pub use bookings::BookingStore;
pub use flights::FlightStore;
pub use journeys::JourneyStore;
pub use outbox::OutboxStore;
pub use seats::SeatStore;

use aerobook_core::DomainError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Build a connection pool for the booking database.
///
/// # Errors
///
/// Returns [`DomainError::StoreUnavailable`] if the database cannot be
/// reached within the connect timeout.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
        .map_err(|e| DomainError::StoreUnavailable(format!("connecting to postgres: {e}")))
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns [`DomainError::StoreUnavailable`] if migrations cannot be applied.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::StoreUnavailable(format!("running migrations: {e}")))
}

/// Cheap readiness probe.
///
/// # Errors
///
/// Returns [`DomainError::StoreUnavailable`] if the round trip fails.
pub async fn ping(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| DomainError::StoreUnavailable(format!("pinging postgres: {e}")))?;
    Ok(())
}

/// Classify a sqlx error for callers: connectivity problems are retryable
/// (`STORE_UNAVAILABLE`), anything else is `INTERNAL`.
pub(crate) fn store_error(context: &str, error: sqlx::Error) -> DomainError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Tls(_) => DomainError::StoreUnavailable(format!("{context}: {error}")),
        _ => DomainError::Internal(format!("{context}: {error}")),
    }
}
