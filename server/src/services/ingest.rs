//! Admin flight ingestion.
//!
//! Validates a flight-creation request, persists the flight with its full
//! seat inventory and outbox row in one transaction, then attempts a direct
//! publish of the `flights.created` event. A failed publish is only logged;
//! the outbox publisher task is the backstop, so the event is never lost
//! once the transaction commits.

use crate::state::AppState;
use aerobook_core::event::FlightCreated;
use aerobook_core::types::{AirportCode, Flight, FlightId, FlightStatus, Money, SeatNumber};
use aerobook_core::DomainError;
use chrono::{DateTime, Utc};

/// Upper bound on seats per flight.
pub const MAX_SEATS_PER_FLIGHT: u32 = 500;

const SEAT_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// A validated-shape flight creation request (codes already parsed).
#[derive(Clone, Debug)]
pub struct NewFlight {
    /// Departure airport.
    pub source_airport: AirportCode,
    /// Arrival airport.
    pub destination_airport: AirportCode,
    /// Departure instant.
    pub departure: DateTime<Utc>,
    /// Arrival instant.
    pub arrival: DateTime<Utc>,
    /// Aircraft identifier.
    pub airplane_id: String,
    /// Price per seat.
    pub price: Money,
    /// Seats to materialise.
    pub total_seats: u32,
}

/// Static validation of a flight creation request.
///
/// # Errors
///
/// Returns [`DomainError::Validation`] naming the first failing rule.
pub fn validate(new: &NewFlight, now: DateTime<Utc>) -> Result<(), DomainError> {
    if new.source_airport == new.destination_airport {
        return Err(DomainError::Validation(
            "source and destination airports must differ".to_string(),
        ));
    }
    if new.departure <= now {
        return Err(DomainError::Validation(
            "departure must be in the future".to_string(),
        ));
    }
    if new.arrival <= new.departure {
        return Err(DomainError::Validation(
            "arrival must be strictly after departure".to_string(),
        ));
    }
    if new.price.is_zero() {
        return Err(DomainError::Validation(
            "price must be greater than zero".to_string(),
        ));
    }
    if new.total_seats == 0 || new.total_seats > MAX_SEATS_PER_FLIGHT {
        return Err(DomainError::Validation(format!(
            "totalSeats must be between 1 and {MAX_SEATS_PER_FLIGHT}"
        )));
    }
    if new.airplane_id.trim().is_empty() {
        return Err(DomainError::Validation(
            "airplaneId must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Generate seat labels six-across: `1A..1F, 2A..`.
#[must_use]
pub fn seat_numbers(total: u32) -> Vec<SeatNumber> {
    (0..total)
        .map(|i| {
            let row = i / 6 + 1;
            let letter = SEAT_LETTERS[(i % 6) as usize];
            SeatNumber::new(format!("{row}{letter}"))
        })
        .collect()
}

/// Validate, persist, and announce a new flight.
///
/// # Errors
///
/// Returns [`DomainError::Validation`] for a bad request, otherwise store
/// errors from persistence.
pub async fn create_flight(state: &AppState, new: NewFlight) -> Result<Flight, DomainError> {
    let now = Utc::now();
    validate(&new, now)?;

    let flight = Flight {
        id: FlightId::new(),
        source_airport: new.source_airport,
        destination_airport: new.destination_airport,
        departure: new.departure,
        arrival: new.arrival,
        airplane_id: new.airplane_id,
        price: new.price,
        status: FlightStatus::Active,
    };
    let event = FlightCreated::for_flight(&flight, now);
    let labels = seat_numbers(new.total_seats);

    let outbox_id = state
        .flights
        .create_with_seats(&flight, &labels, &event)
        .await?;

    // Happy-path publish; the outbox task recovers if this fails or if we
    // crash before marking the row.
    match state.publisher.publish(&event).await {
        Ok(()) => {
            if let Err(error) = state.outbox.mark_published(outbox_id).await {
                tracing::warn!(%outbox_id, %error, "Published but could not mark outbox row");
            }
        }
        Err(error) => {
            tracing::warn!(
                flight_id = %flight.id,
                %error,
                "Direct event publish failed; outbox will recover"
            );
        }
    }

    Ok(flight)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Duration;

    fn valid_request(now: DateTime<Utc>) -> NewFlight {
        NewFlight {
            source_airport: AirportCode::parse("JFK").unwrap(),
            destination_airport: AirportCode::parse("LAX").unwrap(),
            departure: now + Duration::hours(6),
            arrival: now + Duration::hours(12),
            airplane_id: "A320-12".to_string(),
            price: Money::from_cents(25_000),
            total_seats: 180,
        }
    }

    #[test]
    fn accepts_a_well_formed_request() {
        let now = Utc::now();
        assert!(validate(&valid_request(now), now).is_ok());
    }

    #[test]
    fn rejects_each_invalid_field() {
        let now = Utc::now();

        let mut same_route = valid_request(now);
        same_route.destination_airport = same_route.source_airport.clone();
        assert!(validate(&same_route, now).is_err());

        let mut past = valid_request(now);
        past.departure = now - Duration::minutes(1);
        assert!(validate(&past, now).is_err());

        let mut inverted = valid_request(now);
        inverted.arrival = inverted.departure;
        assert!(validate(&inverted, now).is_err());

        let mut free = valid_request(now);
        free.price = Money::from_cents(0);
        assert!(validate(&free, now).is_err());

        let mut empty = valid_request(now);
        empty.total_seats = 0;
        assert!(validate(&empty, now).is_err());

        let mut oversized = valid_request(now);
        oversized.total_seats = MAX_SEATS_PER_FLIGHT + 1;
        assert!(validate(&oversized, now).is_err());
    }

    #[test]
    fn seat_labels_go_six_across_and_stay_unique() {
        let labels = seat_numbers(8);
        let rendered: Vec<&str> = labels.iter().map(SeatNumber::as_str).collect();
        assert_eq!(rendered, ["1A", "1B", "1C", "1D", "1E", "1F", "2A", "2B"]);

        let all = seat_numbers(MAX_SEATS_PER_FLIGHT);
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }
}
