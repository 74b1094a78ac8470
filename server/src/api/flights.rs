//! Admin flight endpoints.
//!
//! - `POST /admin/flights`: create a flight and its seat inventory
//! - `GET /admin/flights/{id}`: read a flight back

use crate::error::AppError;
use crate::services::ingest::{self, NewFlight};
use crate::state::AppState;
use aerobook_core::types::{AirportCode, Flight, FlightId, Money};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /admin/flights` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlightRequest {
    /// Departure airport code.
    pub source_airport: String,
    /// Arrival airport code.
    pub destination_airport: String,
    /// Departure, RFC 3339 with offset.
    pub departure_time: String,
    /// Arrival, RFC 3339 with offset.
    pub arrival_time: String,
    /// Aircraft identifier.
    pub airplane_id: String,
    /// Price per seat, in currency units (e.g. `199.99`).
    pub price: f64,
    /// Number of seats to materialise.
    pub total_seats: u32,
}

/// Flight resource on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightResponse {
    /// Flight id.
    pub flight_id: Uuid,
    /// Departure airport code.
    pub source_airport: String,
    /// Arrival airport code.
    pub destination_airport: String,
    /// Departure, RFC 3339 UTC.
    pub departure_time: String,
    /// Arrival, RFC 3339 UTC.
    pub arrival_time: String,
    /// Aircraft identifier.
    pub airplane_id: String,
    /// Price per seat, in currency units.
    pub price: f64,
    /// Seats on the flight.
    pub total_seats: u32,
    /// Lifecycle status.
    pub status: String,
}

impl FlightResponse {
    #[allow(clippy::cast_precision_loss)]
    fn from_flight(flight: &Flight, total_seats: u32) -> Self {
        Self {
            flight_id: *flight.id.as_uuid(),
            source_airport: flight.source_airport.to_string(),
            destination_airport: flight.destination_airport.to_string(),
            departure_time: flight.departure.to_rfc3339(),
            arrival_time: flight.arrival.to_rfc3339(),
            airplane_id: flight.airplane_id.clone(),
            price: flight.price.cents() as f64 / 100.0,
            total_seats,
            status: flight.status.as_str().to_string(),
        }
    }
}

/// Parse an RFC 3339 timestamp (any offset) into a UTC instant.
fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| AppError::bad_request(format!("{field} must be an RFC 3339 timestamp")))
}

/// Parse a wire price in currency units into cents.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_price(value: f64) -> Result<Money, AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::bad_request("price must be greater than zero"));
    }
    Ok(Money::from_cents((value * 100.0).round() as u64))
}

/// `POST /admin/flights`
///
/// # Errors
///
/// 400 on any validation failure, 5xx on store failure.
pub async fn create_flight(
    State(state): State<AppState>,
    Json(request): Json<CreateFlightRequest>,
) -> Result<(StatusCode, Json<FlightResponse>), AppError> {
    let new = NewFlight {
        source_airport: AirportCode::parse(&request.source_airport).map_err(AppError::from)?,
        destination_airport: AirportCode::parse(&request.destination_airport)
            .map_err(AppError::from)?,
        departure: parse_instant("departureTime", &request.departure_time)?,
        arrival: parse_instant("arrivalTime", &request.arrival_time)?,
        airplane_id: request.airplane_id,
        price: parse_price(request.price)?,
        total_seats: request.total_seats,
    };
    let total_seats = new.total_seats;

    let flight = ingest::create_flight(&state, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(FlightResponse::from_flight(&flight, total_seats)),
    ))
}

/// `GET /admin/flights/{id}`
///
/// # Errors
///
/// 404 for an unknown flight, 5xx on store failure.
pub async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightResponse>, AppError> {
    let flight_id = FlightId::from_uuid(id);
    let flight = state
        .flights
        .get(flight_id)
        .await?
        .ok_or_else(|| AppError::not_found("flight", flight_id))?;
    let total_seats = state.seats.count_total(flight_id).await?;
    Ok(Json(FlightResponse::from_flight(&flight, total_seats)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn instants_accept_any_offset_and_normalise_to_utc() {
        let parsed = parse_instant("departureTime", "2026-06-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-06-01T08:00:00+00:00");

        assert!(parse_instant("departureTime", "yesterday").is_err());
    }

    #[test]
    fn prices_convert_to_cents() {
        assert_eq!(parse_price(199.99).unwrap().cents(), 19_999);
        assert!(parse_price(0.0).is_err());
        assert!(parse_price(-1.0).is_err());
        assert!(parse_price(f64::NAN).is_err());
    }
}
