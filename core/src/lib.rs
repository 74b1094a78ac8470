//! Domain core for the Aerobook flight booking backend.
//!
//! This crate holds everything that does not touch a wire or a store:
//!
//! - [`types`]: identifiers, airports, money, and the four entities
//!   (flight, seat, journey, booking) with their status machines
//! - [`journey`]: the journey rules and the bounded bidirectional
//!   traversal that enumerates every valid 1–3 leg journey through a
//!   newly created flight
//! - [`event`]: the `flights.created` bus payload
//! - [`error`]: the error kinds surfaced to callers
//!
//! Infrastructure crates (`aerobook-postgres`, `aerobook-redis`,
//! `aerobook-redpanda`) depend on this crate; it depends on none of them.

pub mod error;
pub mod event;
pub mod journey;
pub mod types;

pub use error::{DomainError, Result};
pub use event::{FlightCreated, FLIGHTS_CREATED_TOPIC};
pub use journey::{enumerate_journeys, JourneyCandidate, JourneyRules};
pub use types::{
    AirportCode, Booking, BookingId, BookingStatus, Flight, FlightId, FlightStatus, Journey,
    JourneyId, JourneyStatus, Money, PaymentId, Seat, SeatId, SeatNumber, SeatStatus, UserId,
};
