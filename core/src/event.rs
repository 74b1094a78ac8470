//! Bus payloads.
//!
//! Admin ingest publishes a [`FlightCreated`] event for every persisted
//! flight; the journey precomputer consumes it. Delivery is at-least-once
//! and ordered per partition, keyed by flight id, so consumers must treat
//! redelivery as normal.

use crate::types::{AirportCode, Flight, FlightId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic carrying [`FlightCreated`] events.
pub const FLIGHTS_CREATED_TOPIC: &str = "flights.created";

/// Payload of a `flights.created` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightCreated {
    /// The flight that was created.
    pub flight_id: FlightId,
    /// Departure airport.
    pub source_airport: AirportCode,
    /// Arrival airport.
    pub destination_airport: AirportCode,
    /// Departure instant (UTC).
    pub departure_instant: DateTime<Utc>,
    /// When the event was emitted.
    pub emitted_at: DateTime<Utc>,
}

impl FlightCreated {
    /// Build the event for a freshly persisted flight.
    #[must_use]
    pub fn for_flight(flight: &Flight, emitted_at: DateTime<Utc>) -> Self {
        Self {
            flight_id: flight.id,
            source_airport: flight.source_airport.clone(),
            destination_airport: flight.destination_airport.clone(),
            departure_instant: flight.departure,
            emitted_at,
        }
    }

    /// Partition key: events for one flight stay ordered.
    #[must_use]
    pub fn partition_key(&self) -> String {
        self.flight_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn wire_format_is_camel_case() {
        let event = FlightCreated {
            flight_id: FlightId::new(),
            source_airport: AirportCode::parse("JFK").unwrap(),
            destination_airport: AirportCode::parse("LAX").unwrap(),
            departure_instant: Utc::now(),
            emitted_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("flightId").is_some());
        assert!(json.get("sourceAirport").is_some());
        assert!(json.get("departureInstant").is_some());
        assert!(json.get("emittedAt").is_some());

        let back: FlightCreated = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
