//! Outbox for `flights.created` events.
//!
//! Rows are written by [`crate::FlightStore::create_with_seats`] inside the
//! ingest transaction. The publisher task drains pending rows oldest-first,
//! publishes to the bus, and marks them published, so a flight persisted
//! during a bus outage is still announced eventually. Consumers see
//! at-least-once delivery either way.

use crate::store_error;
use aerobook_core::event::FlightCreated;
use aerobook_core::DomainError;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// A pending outbox row.
#[derive(Clone, Debug)]
pub struct PendingEvent {
    /// Outbox row id.
    pub event_id: Uuid,
    /// Decoded event payload.
    pub event: FlightCreated,
    /// When the row was enqueued.
    pub created_at: DateTime<Utc>,
}

/// Store for the `flight_event_outbox` table.
#[derive(Clone)]
pub struct OutboxStore {
    pool: PgPool,
}

impl OutboxStore {
    /// Create a store over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Up to `limit` unpublished events, oldest first.
    ///
    /// A row whose payload fails to decode is skipped with an error log
    /// rather than wedging the whole queue.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn fetch_pending(&self, limit: u32) -> Result<Vec<PendingEvent>, DomainError> {
        let rows: Vec<(Uuid, serde_json::Value, DateTime<Utc>)> = sqlx::query_as(
            "SELECT event_id, payload, created_at FROM flight_event_outbox
             WHERE published_at IS NULL
             ORDER BY created_at
             LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("fetching pending events", e))?;

        let mut pending = Vec::with_capacity(rows.len());
        for (event_id, payload, created_at) in rows {
            match serde_json::from_value::<FlightCreated>(payload) {
                Ok(event) => pending.push(PendingEvent {
                    event_id,
                    event,
                    created_at,
                }),
                Err(error) => {
                    tracing::error!(%event_id, %error, "Undecodable outbox payload; skipping");
                }
            }
        }
        Ok(pending)
    }

    /// Mark an outbox row as published.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn mark_published(&self, event_id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE flight_event_outbox SET published_at = NOW()
             WHERE event_id = $1 AND published_at IS NULL",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("marking event published", e))?;
        Ok(())
    }
}
