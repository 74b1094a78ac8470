//! Journey catalogue persistence.
//!
//! Journeys are a materialised view over flights, produced by the
//! precomputer. Inserts are idempotent: a partial unique index over the
//! signature (ordered flight-id tuple) for ACTIVE rows turns redelivered
//! events into no-ops.

use crate::flights::decode_airport;
use crate::store_error;
use aerobook_core::journey::JourneyCandidate;
use aerobook_core::types::{FlightId, Journey, JourneyId, JourneyStatus, Money};
use aerobook_core::DomainError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use smallvec::SmallVec;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

type JourneyRow = (
    Uuid,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    i64,
    String,
);

const JOURNEY_COLUMNS: &str =
    "journey_id, source_airport, destination_airport, departure, arrival, total_price_cents, status";

/// Store for the `journeys` and `journey_flights` tables.
#[derive(Clone)]
pub struct JourneyStore {
    pool: PgPool,
}

impl JourneyStore {
    /// Create a store over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a journey candidate unless an ACTIVE journey with the same
    /// signature already exists.
    ///
    /// Returns the new journey id when a row was inserted, `None` when the
    /// signature conflicted (which callers treat as success).
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn insert_if_absent(
        &self,
        candidate: &JourneyCandidate,
    ) -> Result<Option<JourneyId>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("beginning journey transaction", e))?;

        #[allow(clippy::cast_possible_wrap)]
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO journeys
                 (journey_id, signature, source_airport, destination_airport,
                  departure, arrival, total_price_cents, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'ACTIVE')
             ON CONFLICT (signature) WHERE status = 'ACTIVE' DO NOTHING
             RETURNING journey_id",
        )
        .bind(Uuid::new_v4())
        .bind(candidate.signature())
        .bind(candidate.source_airport.as_str())
        .bind(candidate.destination_airport.as_str())
        .bind(candidate.departure)
        .bind(candidate.arrival)
        .bind(candidate.total_price.cents() as i64)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_error("inserting journey", e))?;

        let Some((journey_id,)) = inserted else {
            // Signature already present: redelivery or a concurrent event
            // produced the same path. Nothing to do.
            tx.rollback()
                .await
                .map_err(|e| store_error("rolling back duplicate journey", e))?;
            return Ok(None);
        };

        let leg_ids: Vec<Uuid> = candidate.legs.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query(
            "INSERT INTO journey_flights (journey_id, flight_id, leg_order)
             SELECT $1, t.flight_id, t.ord::smallint
             FROM UNNEST($2::uuid[]) WITH ORDINALITY AS t(flight_id, ord)",
        )
        .bind(journey_id)
        .bind(&leg_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("inserting journey legs", e))?;

        tx.commit()
            .await
            .map_err(|e| store_error("committing journey transaction", e))?;

        Ok(Some(JourneyId::from_uuid(journey_id)))
    }

    /// Fetch a journey (with ordered legs) by id.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn get(&self, id: JourneyId) -> Result<Option<Journey>, DomainError> {
        let row: Option<JourneyRow> = sqlx::query_as(&format!(
            "SELECT {JOURNEY_COLUMNS} FROM journeys WHERE journey_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("loading journey", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let legs: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT flight_id FROM journey_flights WHERE journey_id = $1 ORDER BY leg_order",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("loading journey legs", e))?;

        let legs: SmallVec<[FlightId; 3]> = legs
            .into_iter()
            .map(|(flight_id,)| FlightId::from_uuid(flight_id))
            .collect();

        decode_journey(row, legs).map(Some)
    }

    /// All ACTIVE journeys for a route departing on the given UTC day, in
    /// departure order.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn search_active(
        &self,
        source: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<Journey>, DomainError> {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);

        let rows: Vec<JourneyRow> = sqlx::query_as(&format!(
            "SELECT {JOURNEY_COLUMNS} FROM journeys
             WHERE status = 'ACTIVE'
               AND source_airport = $1 AND destination_airport = $2
               AND departure >= $3 AND departure < $4
             ORDER BY departure"
        ))
        .bind(source)
        .bind(destination)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("searching journeys", e))?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let journey_ids: Vec<Uuid> = rows.iter().map(|row| row.0).collect();
        let leg_rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT journey_id, flight_id FROM journey_flights
             WHERE journey_id = ANY($1)
             ORDER BY journey_id, leg_order",
        )
        .bind(&journey_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("loading journey legs", e))?;

        let mut legs_by_journey: HashMap<Uuid, SmallVec<[FlightId; 3]>> = HashMap::new();
        for (journey_id, flight_id) in leg_rows {
            legs_by_journey
                .entry(journey_id)
                .or_default()
                .push(FlightId::from_uuid(flight_id));
        }

        rows.into_iter()
            .map(|row| {
                let legs = legs_by_journey.remove(&row.0).unwrap_or_default();
                decode_journey(row, legs)
            })
            .collect()
    }
}

#[allow(clippy::cast_sign_loss)] // total_price_cents has a non-negative check
fn decode_journey(row: JourneyRow, legs: SmallVec<[FlightId; 3]>) -> Result<Journey, DomainError> {
    let (id, source, destination, departure, arrival, total_price_cents, status) = row;
    Ok(Journey {
        id: JourneyId::from_uuid(id),
        legs,
        source_airport: decode_airport(&source)?,
        destination_airport: decode_airport(&destination)?,
        departure,
        arrival,
        total_price: Money::from_cents(total_price_cents as u64),
        status: JourneyStatus::parse(&status)?,
    })
}
