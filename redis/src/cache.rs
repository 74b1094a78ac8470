//! Search cache over the journey catalogue.
//!
//! Keys are `journeys:{src}:{dst}:{date}` holding the JSON-serialised list
//! of ACTIVE journeys for that route and day. Seat availability is never
//! cached; the search service recomputes it per request, which is why
//! bookings do not invalidate this cache. Journey creation invalidates a
//! whole route (`journeys:{src}:{dst}:*`) so new connections show up
//! immediately instead of after the TTL.

use crate::lock_store_error;
use aerobook_core::types::Journey;
use aerobook_core::DomainError;
use chrono::NaiveDate;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Read cache for journey search results.
#[derive(Clone)]
pub struct SearchCache {
    conn: ConnectionManager,
}

impl SearchCache {
    /// Create a cache over a managed connection.
    #[must_use]
    pub const fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn entry_key(source: &str, destination: &str, date: NaiveDate) -> String {
        format!("journeys:{source}:{destination}:{date}")
    }

    fn route_pattern(source: &str, destination: &str) -> String {
        format!("journeys:{source}:{destination}:*")
    }

    /// Cached journey list for a route and day, if present and decodable.
    ///
    /// An undecodable entry (e.g. after a format change) is treated as a
    /// miss and deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on a transport failure.
    pub async fn get(
        &self,
        source: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Option<Vec<Journey>>, DomainError> {
        let key = Self::entry_key(source, destination, date);
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| lock_store_error("reading search cache", &e))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(journeys) => Ok(Some(journeys)),
            Err(error) => {
                tracing::warn!(%key, %error, "Dropping undecodable cache entry");
                let _: () = conn
                    .del(&key)
                    .await
                    .map_err(|e| lock_store_error("dropping cache entry", &e))?;
                Ok(None)
            }
        }
    }

    /// Store a journey list for a route and day.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on a transport failure and
    /// [`DomainError::Internal`] if the list cannot be serialised.
    pub async fn put(
        &self,
        source: &str,
        destination: &str,
        date: NaiveDate,
        journeys: &[Journey],
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let raw = serde_json::to_string(journeys)
            .map_err(|e| DomainError::Internal(format!("encoding cache entry: {e}")))?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                Self::entry_key(source, destination, date),
                raw,
                ttl.as_secs(),
            )
            .await
            .map_err(|e| lock_store_error("writing search cache", &e))?;
        Ok(())
    }

    /// Delete every cached day for a route. Returns how many entries went.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on a transport failure.
    pub async fn invalidate_route(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<u64, DomainError> {
        let pattern = Self::route_pattern(source, destination);
        let mut conn = self.conn.clone();

        let keys: Vec<String> = {
            let mut iter = conn
                .scan_match::<_, String>(&pattern)
                .await
                .map_err(|e| lock_store_error("scanning search cache", &e))?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: u64 = conn
            .del(&keys)
            .await
            .map_err(|e| lock_store_error("invalidating search cache", &e))?;

        tracing::debug!(%pattern, deleted, "Invalidated search cache route");
        Ok(deleted)
    }
}
