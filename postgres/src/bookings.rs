//! Booking persistence and the durable seat commit.
//!
//! The relational transaction here is the source of truth for a booking.
//! Lock-store reservations only bound contention; the conditional seat
//! update below is the safety net that makes double booking impossible
//! even when a reservation expired between reserve and commit.

use crate::store_error;
use aerobook_core::types::{
    Booking, BookingId, BookingStatus, JourneyId, PaymentId, SeatId, UserId,
};
use aerobook_core::DomainError;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

type BookingRow = (Uuid, Uuid, Uuid, i32, String, String, DateTime<Utc>);

const BOOKING_COLUMNS: &str =
    "booking_id, user_id, journey_id, passenger_count, status, payment_id, created_at";

/// Store for the `bookings` table and the seat state transition.
#[derive(Clone)]
pub struct BookingStore {
    pool: PgPool,
}

impl BookingStore {
    /// Create a store over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Durably commit a booking: insert the booking row, flip every chosen
    /// seat `AVAILABLE → BOOKED`, and confirm the booking, atomically.
    ///
    /// The seat update is conditional on `status = 'AVAILABLE'`; if any
    /// chosen seat was taken since admission the affected row count falls
    /// short, the transaction rolls back, and the caller gets
    /// [`DomainError::SeatsRaceLost`]. At most one of two racing bookings
    /// can satisfy the condition on a given seat row.
    ///
    /// # Errors
    ///
    /// [`DomainError::SeatsRaceLost`] when a concurrent booking took any of
    /// the chosen seats; otherwise a store error on database failure.
    pub async fn commit(&self, booking: &Booking, seat_ids: &[SeatId]) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("beginning booking transaction", e))?;

        #[allow(clippy::cast_possible_wrap)]
        sqlx::query(
            "INSERT INTO bookings
                 (booking_id, user_id, journey_id, passenger_count, status, payment_id, created_at)
             VALUES ($1, $2, $3, $4, 'RESERVED', $5, $6)",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(booking.journey_id.as_uuid())
        .bind(booking.passenger_count as i32)
        .bind(booking.payment_id.as_str())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("inserting booking", e))?;

        let ids: Vec<Uuid> = seat_ids.iter().map(|id| *id.as_uuid()).collect();
        let updated = sqlx::query(
            "UPDATE seats SET status = 'BOOKED', booking_id = $1
             WHERE seat_id = ANY($2) AND status = 'AVAILABLE'",
        )
        .bind(booking.id.as_uuid())
        .bind(&ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("booking seats", e))?
        .rows_affected();

        if updated != seat_ids.len() as u64 {
            tx.rollback()
                .await
                .map_err(|e| store_error("rolling back lost booking", e))?;
            tracing::warn!(
                booking_id = %booking.id,
                expected = seat_ids.len(),
                updated,
                "Seat commit lost the race; rolled back"
            );
            return Err(DomainError::SeatsRaceLost);
        }

        sqlx::query("UPDATE bookings SET status = 'CONFIRMED' WHERE booking_id = $1")
            .bind(booking.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("confirming booking", e))?;

        tx.commit()
            .await
            .map_err(|e| store_error("committing booking transaction", e))?;

        tracing::info!(
            booking_id = %booking.id,
            journey_id = %booking.journey_id,
            seats = seat_ids.len(),
            "Booking confirmed"
        );

        Ok(())
    }

    /// Fetch a booking by id.
    ///
    /// # Errors
    ///
    /// Returns a store error on database failure.
    pub async fn get(&self, id: BookingId) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("loading booking", e))?;

        row.map(decode_booking).transpose()
    }
}

#[allow(clippy::cast_sign_loss)] // passenger_count has a 1..=10 check
fn decode_booking(row: BookingRow) -> Result<Booking, DomainError> {
    let (id, user_id, journey_id, passenger_count, status, payment_id, created_at) = row;
    Ok(Booking {
        id: BookingId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        journey_id: JourneyId::from_uuid(journey_id),
        passenger_count: passenger_count as u32,
        status: BookingStatus::parse(&status)?,
        payment_id: PaymentId::new(payment_id),
        created_at,
    })
}
