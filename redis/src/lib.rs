//! Redis lock store for the Aerobook flight booking backend.
//!
//! Two concerns live here, both ephemeral:
//!
//! - [`holds`]: short-lived seat reservations with wall-clock expiry. The
//!   multi-seat reserve executes as a single Lua script, so two concurrent
//!   bookers can never both observe the same seat as free.
//! - [`cache`]: the search read cache keyed by (source, destination, date),
//!   invalidated per route when the precomputer creates journeys.
//!
//! Redis is never the source of truth; losing it costs at most cached
//! search results and admission filtering until it returns.

pub mod cache;
pub mod holds;

pub use cache::SearchCache;
pub use holds::SeatHoldStore;

use aerobook_core::DomainError;
use redis::aio::ConnectionManager;
use redis::Client;

/// Open a managed connection to the lock store.
///
/// # Errors
///
/// Returns [`DomainError::StoreUnavailable`] if the connection cannot be
/// established.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, DomainError> {
    let client = Client::open(redis_url)
        .map_err(|e| DomainError::StoreUnavailable(format!("creating redis client: {e}")))?;
    ConnectionManager::new(client)
        .await
        .map_err(|e| DomainError::StoreUnavailable(format!("connecting to redis: {e}")))
}

/// Cheap readiness probe.
///
/// # Errors
///
/// Returns [`DomainError::StoreUnavailable`] if the round trip fails.
pub async fn ping(conn: &ConnectionManager) -> Result<(), DomainError> {
    let mut conn = conn.clone();
    let _: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| DomainError::StoreUnavailable(format!("pinging redis: {e}")))?;
    Ok(())
}

pub(crate) fn lock_store_error(context: &str, error: &redis::RedisError) -> DomainError {
    DomainError::StoreUnavailable(format!("{context}: {error}"))
}
