//! Atomic seat holds with wall-clock expiry.
//!
//! Each flight owns one sorted set `holds:{flight_id}` whose members are
//! seat ids and whose scores are expiry instants in milliseconds since the
//! epoch. A seat is held iff its entry exists with a score strictly greater
//! than now. The whole reserve sequence (evict expired, check, write all)
//! runs as one Lua script on the Redis server with no interleaving, which
//! is what prevents two concurrent callers from both admitting the same
//! seat.
//!
//! Holds are an admission filter, not the source of truth: the relational
//! seat commit re-checks availability. Expiry bounds the damage of a caller
//! that crashes between reserve and commit.

use crate::lock_store_error;
use aerobook_core::types::{FlightId, SeatId};
use aerobook_core::DomainError;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

/// Extra lifetime on the containing key beyond the longest hold, so the set
/// itself expires and memory stays bounded even without cleanup calls.
const KEY_TTL_BUFFER: Duration = Duration::from_secs(300);

/// Evict expired members, refuse if any requested seat is still held,
/// otherwise write every requested hold and refresh the key TTL.
///
/// KEYS[1] = holds key; ARGV[1] = now (ms), ARGV[2] = hold expiry (ms),
/// ARGV[3] = key TTL (ms), ARGV[4..] = seat ids.
const RESERVE_SCRIPT: &str = r"
    local key = KEYS[1]
    local now = tonumber(ARGV[1])
    local expiry = tonumber(ARGV[2])
    local key_ttl = tonumber(ARGV[3])

    redis.call('ZREMRANGEBYSCORE', key, '-inf', now)

    for i = 4, #ARGV do
        if redis.call('ZSCORE', key, ARGV[i]) then
            return 0
        end
    end

    for i = 4, #ARGV do
        redis.call('ZADD', key, expiry, ARGV[i])
    end
    redis.call('PEXPIRE', key, key_ttl)
    return 1
";

/// Seat reservation store over the lock store.
#[derive(Clone)]
pub struct SeatHoldStore {
    conn: ConnectionManager,
    reserve_script: Script,
}

impl SeatHoldStore {
    /// Create a store over a managed connection.
    #[must_use]
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            reserve_script: Script::new(RESERVE_SCRIPT),
        }
    }

    fn holds_key(flight_id: FlightId) -> String {
        format!("holds:{flight_id}")
    }

    /// Atomically hold every seat in `seat_ids` for `ttl`, or none of them.
    ///
    /// Returns `true` when all holds were placed, `false` when any seat was
    /// already live-held (in which case nothing was written).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] if the script could not be
    /// executed.
    pub async fn reserve(
        &self,
        flight_id: FlightId,
        seat_ids: &[SeatId],
        ttl: Duration,
    ) -> Result<bool, DomainError> {
        if seat_ids.is_empty() {
            return Ok(true);
        }

        let now_ms = Utc::now().timestamp_millis();
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        let ttl_ms = ttl.as_millis() as i64;
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        let key_ttl_ms = (ttl + KEY_TTL_BUFFER).as_millis() as i64;

        let mut invocation = self.reserve_script.prepare_invoke();
        invocation
            .key(Self::holds_key(flight_id))
            .arg(now_ms)
            .arg(now_ms + ttl_ms)
            .arg(key_ttl_ms);
        for seat in seat_ids {
            invocation.arg(seat.to_string());
        }

        let mut conn = self.conn.clone();
        let granted: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e| lock_store_error("reserving seats", &e))?;

        if granted == 1 {
            tracing::debug!(
                %flight_id,
                seats = seat_ids.len(),
                ttl_ms,
                "Placed seat holds"
            );
        }
        Ok(granted == 1)
    }

    /// Best-effort removal of holds. Missing entries are not errors.
    ///
    /// Returns how many holds were actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on a transport failure.
    pub async fn release(
        &self,
        flight_id: FlightId,
        seat_ids: &[SeatId],
    ) -> Result<usize, DomainError> {
        if seat_ids.is_empty() {
            return Ok(0);
        }

        let members: Vec<String> = seat_ids.iter().map(ToString::to_string).collect();
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .zrem(Self::holds_key(flight_id), members)
            .await
            .map_err(|e| lock_store_error("releasing seats", &e))?;
        Ok(removed)
    }

    /// The subset of `candidates` not currently live-held.
    ///
    /// A read-side hint only: a seat reported free here can be held by the
    /// time a reserve runs.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on a transport failure.
    pub async fn available(
        &self,
        flight_id: FlightId,
        candidates: &[SeatId],
    ) -> Result<Vec<SeatId>, DomainError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let members: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        let mut conn = self.conn.clone();
        let scores: Vec<Option<f64>> = conn
            .zscore_multiple(Self::holds_key(flight_id), &members)
            .await
            .map_err(|e| lock_store_error("checking seat holds", &e))?;

        #[allow(clippy::cast_precision_loss)]
        let now_ms = Utc::now().timestamp_millis() as f64;
        Ok(candidates
            .iter()
            .zip(scores)
            .filter(|(_, score)| score.is_none_or(|expiry| expiry <= now_ms))
            .map(|(seat, _)| *seat)
            .collect())
    }

    /// Remove expired holds for a flight, returning how many were evicted.
    ///
    /// Reserve already evicts inline; this exists for the janitor task so
    /// abandoned flights do not keep dead members until the key TTL fires.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on a transport failure.
    pub async fn cleanup(&self, flight_id: FlightId) -> Result<u64, DomainError> {
        let now_ms = Utc::now().timestamp_millis();
        let mut conn = self.conn.clone();
        let removed: u64 = conn
            .zrembyscore(Self::holds_key(flight_id), "-inf", now_ms)
            .await
            .map_err(|e| lock_store_error("cleaning up holds", &e))?;

        if removed > 0 {
            tracing::debug!(%flight_id, removed, "Evicted expired seat holds");
        }
        Ok(removed)
    }

    /// Sweep expired holds across every flight key, returning the total
    /// number evicted. Used by the periodic janitor task.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on a transport failure.
    pub async fn cleanup_all(&self) -> Result<u64, DomainError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = {
            let mut iter = conn
                .scan_match::<_, String>("holds:*")
                .await
                .map_err(|e| lock_store_error("scanning hold keys", &e))?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        let now_ms = Utc::now().timestamp_millis();
        let mut removed = 0u64;
        for key in keys {
            let evicted: u64 = conn
                .zrembyscore(&key, "-inf", now_ms)
                .await
                .map_err(|e| lock_store_error("cleaning up holds", &e))?;
            removed += evicted;
        }

        if removed > 0 {
            tracing::debug!(removed, "Janitor evicted expired seat holds");
        }
        Ok(removed)
    }
}
