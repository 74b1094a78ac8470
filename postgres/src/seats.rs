//! Seat inventory reads.
//!
//! Seat rows are written by [`crate::FlightStore`] (creation) and
//! [`crate::BookingStore`] (the BOOKED transition); this store covers the
//! read side used by search and by the booking admission step.

use crate::store_error;
use aerobook_core::types::{BookingId, FlightId, Seat, SeatId, SeatNumber, SeatStatus};
use aerobook_core::DomainError;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Store for the `seats` table.
#[derive(Clone)]
pub struct SeatStore {
    pool: PgPool,
}

impl SeatStore {
    /// Create a store over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Up to `limit` AVAILABLE seats on a flight, in seat-number order.
    ///
    /// The ordering is a deterministic selection policy, not a contract:
    /// callers only rely on getting *some* `limit` available seats.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn available_seats(
        &self,
        flight_id: FlightId,
        limit: u32,
    ) -> Result<Vec<(SeatId, SeatNumber)>, DomainError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT seat_id, seat_number FROM seats
             WHERE flight_id = $1 AND status = 'AVAILABLE'
             ORDER BY seat_number
             LIMIT $2",
        )
        .bind(flight_id.as_uuid())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("selecting available seats", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, number)| (SeatId::from_uuid(id), SeatNumber::new(number)))
            .collect())
    }

    /// Count of AVAILABLE seats per flight, for every flight in `flight_ids`.
    ///
    /// Flights with no available seats are present in the result with a
    /// count of zero, so callers can take a minimum across legs directly.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn count_available(
        &self,
        flight_ids: &[FlightId],
    ) -> Result<HashMap<FlightId, u32>, DomainError> {
        let ids: Vec<Uuid> = flight_ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT flight_id, COUNT(*) FROM seats
             WHERE flight_id = ANY($1) AND status = 'AVAILABLE'
             GROUP BY flight_id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("counting available seats", e))?;

        let mut counts: HashMap<FlightId, u32> =
            flight_ids.iter().map(|id| (*id, 0)).collect();
        for (flight_id, count) in rows {
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            counts.insert(FlightId::from_uuid(flight_id), count as u32);
        }
        Ok(counts)
    }

    /// Total number of seats on a flight, regardless of status.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub async fn count_total(&self, flight_id: FlightId) -> Result<u32, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM seats WHERE flight_id = $1")
                .bind(flight_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| store_error("counting seats", e))?;

        Ok(count as u32)
    }

    /// All seats committed to a booking, in leg then seat-number order.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn seats_for_booking(&self, booking_id: BookingId) -> Result<Vec<Seat>, DomainError> {
        let rows: Vec<(Uuid, Uuid, String, String, Option<Uuid>)> = sqlx::query_as(
            "SELECT seat_id, flight_id, seat_number, status, booking_id FROM seats
             WHERE booking_id = $1
             ORDER BY flight_id, seat_number",
        )
        .bind(booking_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("loading booked seats", e))?;

        rows.into_iter()
            .map(|(seat_id, flight_id, seat_number, status, booking)| {
                Ok(Seat {
                    id: SeatId::from_uuid(seat_id),
                    flight_id: FlightId::from_uuid(flight_id),
                    seat_number: SeatNumber::new(seat_number),
                    status: SeatStatus::parse(&status)?,
                    booking_id: booking.map(BookingId::from_uuid),
                })
            })
            .collect()
    }
}
