//! Booking endpoints.
//!
//! - `POST /bookings` (header `X-User-Id`): book a journey
//! - `GET /bookings/{id}`: booking read-back with seat assignments

use crate::error::AppError;
use crate::services::booking::{self, BookingRequest, ConfirmedBooking};
use crate::state::AppState;
use aerobook_core::types::{Booking, BookingId, JourneyId, PaymentId, Seat, UserId};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /bookings` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Journey to book.
    pub journey_id: String,
    /// Passengers, 1–10.
    pub passenger_count: u32,
    /// Opaque payment reference.
    pub payment_id: String,
}

/// One committed seat on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignmentResponse {
    /// Leg flight.
    pub flight_id: Uuid,
    /// Seat id.
    pub seat_id: Uuid,
    /// Seat label, e.g. `"12C"`.
    pub seat_number: String,
}

/// Booking resource on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Booking id.
    pub booking_id: Uuid,
    /// Booking owner.
    pub user_id: Uuid,
    /// Journey booked.
    pub journey_id: Uuid,
    /// Passengers covered.
    pub passenger_count: u32,
    /// Lifecycle status.
    pub status: String,
    /// Payment reference.
    pub payment_id: String,
    /// Creation instant, RFC 3339 UTC.
    pub created_at: String,
    /// Committed seats across all legs.
    pub seats: Vec<SeatAssignmentResponse>,
}

impl BookingResponse {
    fn from_confirmation(confirmed: &ConfirmedBooking) -> Self {
        let seats = confirmed
            .legs
            .iter()
            .flat_map(|leg| {
                leg.seats.iter().map(|(seat_id, seat_number)| {
                    SeatAssignmentResponse {
                        flight_id: *leg.flight_id.as_uuid(),
                        seat_id: *seat_id.as_uuid(),
                        seat_number: seat_number.to_string(),
                    }
                })
            })
            .collect();
        Self::from_parts(&confirmed.booking, seats)
    }

    fn from_booking_and_seats(booking: &Booking, seats: &[Seat]) -> Self {
        let seats = seats
            .iter()
            .map(|seat| SeatAssignmentResponse {
                flight_id: *seat.flight_id.as_uuid(),
                seat_id: *seat.id.as_uuid(),
                seat_number: seat.seat_number.to_string(),
            })
            .collect();
        Self::from_parts(booking, seats)
    }

    fn from_parts(booking: &Booking, seats: Vec<SeatAssignmentResponse>) -> Self {
        Self {
            booking_id: *booking.id.as_uuid(),
            user_id: *booking.user_id.as_uuid(),
            journey_id: *booking.journey_id.as_uuid(),
            passenger_count: booking.passenger_count,
            status: booking.status.as_str().to_string(),
            payment_id: booking.payment_id.to_string(),
            created_at: booking.created_at.to_rfc3339(),
            seats,
        }
    }
}

fn user_id_from_headers(headers: &HeaderMap) -> Result<UserId, AppError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::bad_request("X-User-Id header is required"))?;
    let uuid = Uuid::parse_str(raw)
        .map_err(|_| AppError::bad_request("X-User-Id must be a UUID"))?;
    Ok(UserId::from_uuid(uuid))
}

/// `POST /bookings`
///
/// # Errors
///
/// 400 on invalid input, 404 for an unknown journey, 409 when a concurrent
/// booking won (`SEATS_RACE_LOST`), 422 when a leg cannot seat everyone
/// (`INSUFFICIENT_SEATS`), 5xx on store failure.
pub async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let journey_id = Uuid::parse_str(&request.journey_id)
        .map(JourneyId::from_uuid)
        .map_err(|_| AppError::bad_request("journeyId must be a UUID"))?;

    let confirmed = booking::create_booking(
        &state,
        user_id,
        BookingRequest {
            journey_id,
            passenger_count: request.passenger_count,
            payment_id: PaymentId::new(request.payment_id),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::from_confirmation(&confirmed)),
    ))
}

/// `GET /bookings/{id}`
///
/// # Errors
///
/// 404 for an unknown booking, 5xx on store failure.
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let (booking, seats) = booking::get_booking(&state, BookingId::from_uuid(id)).await?;
    Ok(Json(BookingResponse::from_booking_and_seats(
        &booking, &seats,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn user_id_header_is_required_and_must_be_a_uuid() {
        let empty = HeaderMap::new();
        assert!(user_id_from_headers(&empty).is_err());

        let mut bad = HeaderMap::new();
        bad.insert("x-user-id", HeaderValue::from_static("someone"));
        assert!(user_id_from_headers(&bad).is_err());

        let mut good = HeaderMap::new();
        good.insert(
            "x-user-id",
            HeaderValue::from_static("550e8400-e29b-41d4-a716-446655440000"),
        );
        assert!(user_id_from_headers(&good).is_ok());
    }
}
