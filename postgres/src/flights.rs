//! Flight persistence.
//!
//! Admin ingest creates a flight, its full seat inventory, and the outbox
//! row for the `flights.created` event in one transaction, so a flight is
//! never visible without its seats or its pending event.

use crate::store_error;
use aerobook_core::event::FlightCreated;
use aerobook_core::types::{AirportCode, Flight, FlightId, FlightStatus, Money, SeatNumber};
use aerobook_core::DomainError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

type FlightRow = (
    Uuid,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    String,
    i64,
    String,
);

const FLIGHT_COLUMNS: &str =
    "flight_id, source_airport, destination_airport, departure, arrival, airplane_id, price_cents, status";

/// Store for the `flights` table (and the seat inventory created with it).
#[derive(Clone)]
pub struct FlightStore {
    pool: PgPool,
}

impl FlightStore {
    /// Create a store over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a flight, materialise its seat inventory, and enqueue the
    /// `flights.created` outbox row, all in one transaction.
    ///
    /// Returns the outbox row id so the caller can mark it published after
    /// a successful direct publish.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] on connectivity failure and
    /// [`DomainError::Internal`] on any other database error (including a
    /// duplicate flight id).
    pub async fn create_with_seats(
        &self,
        flight: &Flight,
        seat_numbers: &[SeatNumber],
        event: &FlightCreated,
    ) -> Result<Uuid, DomainError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| DomainError::Internal(format!("encoding flight event: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("beginning flight transaction", e))?;

        #[allow(clippy::cast_possible_wrap)]
        sqlx::query(
            "INSERT INTO flights
                 (flight_id, source_airport, destination_airport, departure, arrival,
                  airplane_id, price_cents, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(flight.id.as_uuid())
        .bind(flight.source_airport.as_str())
        .bind(flight.destination_airport.as_str())
        .bind(flight.departure)
        .bind(flight.arrival)
        .bind(&flight.airplane_id)
        .bind(flight.price.cents() as i64)
        .bind(flight.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("inserting flight", e))?;

        let seat_ids: Vec<Uuid> = seat_numbers.iter().map(|_| Uuid::new_v4()).collect();
        let labels: Vec<String> = seat_numbers
            .iter()
            .map(|n| n.as_str().to_string())
            .collect();

        sqlx::query(
            "INSERT INTO seats (seat_id, flight_id, seat_number)
             SELECT t.seat_id, $1, t.seat_number
             FROM UNNEST($2::uuid[], $3::text[]) AS t(seat_id, seat_number)",
        )
        .bind(flight.id.as_uuid())
        .bind(&seat_ids)
        .bind(&labels)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("materialising seats", e))?;

        let outbox_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO flight_event_outbox (event_id, flight_id, payload) VALUES ($1, $2, $3)",
        )
        .bind(outbox_id)
        .bind(flight.id.as_uuid())
        .bind(&payload)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("enqueueing flight event", e))?;

        tx.commit()
            .await
            .map_err(|e| store_error("committing flight transaction", e))?;

        tracing::info!(
            flight_id = %flight.id,
            route = %format!("{}-{}", flight.source_airport, flight.destination_airport),
            seats = seat_numbers.len(),
            "Persisted flight with seat inventory"
        );

        Ok(outbox_id)
    }

    /// Fetch a flight by id.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn get(&self, id: FlightId) -> Result<Option<Flight>, DomainError> {
        let row: Option<FlightRow> = sqlx::query_as(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE flight_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("loading flight", e))?;

        row.map(decode_flight).transpose()
    }

    /// All ACTIVE flights departing on the given UTC calendar day.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn list_active_on(&self, date: NaiveDate) -> Result<Vec<Flight>, DomainError> {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);

        let rows: Vec<FlightRow> = sqlx::query_as(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights
             WHERE status = 'ACTIVE' AND departure >= $1 AND departure < $2
             ORDER BY departure"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("listing same-day flights", e))?;

        rows.into_iter().map(decode_flight).collect()
    }
}

#[allow(clippy::cast_sign_loss)] // price_cents has a non-negative check
fn decode_flight(row: FlightRow) -> Result<Flight, DomainError> {
    let (id, source, destination, departure, arrival, airplane_id, price_cents, status) = row;
    Ok(Flight {
        id: FlightId::from_uuid(id),
        source_airport: decode_airport(&source)?,
        destination_airport: decode_airport(&destination)?,
        departure,
        arrival,
        airplane_id,
        price: Money::from_cents(price_cents as u64),
        status: FlightStatus::parse(&status)?,
    })
}

pub(crate) fn decode_airport(code: &str) -> Result<AirportCode, DomainError> {
    AirportCode::parse(code)
        .map_err(|e| DomainError::Internal(format!("corrupt airport code in store: {e}")))
}
