//! Domain types for the flight booking backend.
//!
//! Value objects (identifiers, airport codes, money) and the four entities
//! of the data model: flights, seats, journeys, and bookings. Everything
//! here is plain data; persistence and wire formats live in the
//! infrastructure crates.

use crate::error::DomainError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightId(Uuid);

impl FlightId {
    /// Creates a new random `FlightId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `FlightId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FlightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId(Uuid);

impl SeatId {
    /// Creates a new random `SeatId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `SeatId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SeatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a journey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JourneyId(Uuid);

impl JourneyId {
    /// Creates a new random `JourneyId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `JourneyId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JourneyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user.
///
/// Users are managed outside the core; this is the opaque id carried on
/// booking requests via the `X-User-Id` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Create a `UserId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque payment reference supplied by the caller.
///
/// Payment processing is an external collaborator; the core only records
/// the reference on the booking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(String);

impl PaymentId {
    /// Wrap a caller-supplied payment reference.
    #[must_use]
    pub const fn new(reference: String) -> Self {
        Self(reference)
    }

    /// The reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Airport codes
// ============================================================================

/// 3-letter uppercase IATA-style airport code.
///
/// Parsing uppercases the input, so `"lhr"` and `"LHR"` denote the same
/// airport. Deserialization goes through [`AirportCode::parse`], which means
/// an invalid code on the wire is rejected before it reaches a handler.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirportCode(String);

impl AirportCode {
    /// Parse and validate an airport code.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] unless the input is exactly three
    /// ASCII letters.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(DomainError::Validation(format!(
                "airport code must be 3 letters, got {code:?}"
            )))
        }
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AirportCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AirportCode> for String {
    fn from(code: AirportCode) -> Self {
        code.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money (cents-based to avoid floating point errors)
// ============================================================================

/// A non-negative amount of money in cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Sums an iterator of amounts, saturating at `u64::MAX`.
    pub fn saturating_sum(amounts: impl IntoIterator<Item = Self>) -> Self {
        Self(
            amounts
                .into_iter()
                .fold(0u64, |acc, m| acc.saturating_add(m.0)),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Flight
// ============================================================================

/// Immutable schedule unit created by admin ingest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Unique flight identifier.
    pub id: FlightId,
    /// Departure airport.
    pub source_airport: AirportCode,
    /// Arrival airport, distinct from the source.
    pub destination_airport: AirportCode,
    /// Departure instant (UTC).
    pub departure: DateTime<Utc>,
    /// Arrival instant (UTC), strictly after departure.
    pub arrival: DateTime<Utc>,
    /// Aircraft assigned to the flight.
    pub airplane_id: String,
    /// Price for one seat.
    pub price: Money,
    /// Lifecycle status.
    pub status: FlightStatus,
}

impl Flight {
    /// The UTC calendar day the flight departs on.
    #[must_use]
    pub fn departure_date(&self) -> NaiveDate {
        self.departure.date_naive()
    }

    /// Scheduled block time.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.arrival - self.departure
    }
}

/// Flight lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    /// Scheduled and bookable.
    Active,
    /// Cancelled by the airline.
    Cancelled,
    /// Delayed; schedule no longer authoritative.
    Delayed,
    /// Flown.
    Completed,
}

impl FlightStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::Delayed => "DELAYED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parse a status from its database string.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Internal`] for an unknown status string.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "CANCELLED" => Ok(Self::Cancelled),
            "DELAYED" => Ok(Self::Delayed),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(DomainError::Internal(format!(
                "unknown flight status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Seat
// ============================================================================

/// Seat label within a flight, e.g. `"12C"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatNumber(String);

impl SeatNumber {
    /// Wrap a seat label.
    #[must_use]
    pub const fn new(label: String) -> Self {
        Self(label)
    }

    /// The label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical seat on one flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Unique seat identifier.
    pub id: SeatId,
    /// Flight this seat belongs to.
    pub flight_id: FlightId,
    /// Label unique within the flight.
    pub seat_number: SeatNumber,
    /// Current status.
    pub status: SeatStatus,
    /// Booking holding the seat, set iff status is RESERVED or BOOKED.
    pub booking_id: Option<BookingId>,
}

/// Seat status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// Free to book.
    Available,
    /// Short-lived hold; authoritative holds live in the lock store.
    Reserved,
    /// Durably sold.
    Booked,
    /// Withheld from sale.
    Blocked,
}

impl SeatStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Booked => "BOOKED",
            Self::Blocked => "BLOCKED",
        }
    }

    /// Parse a status from its database string.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Internal`] for an unknown status string.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "RESERVED" => Ok(Self::Reserved),
            "BOOKED" => Ok(Self::Booked),
            "BLOCKED" => Ok(Self::Blocked),
            other => Err(DomainError::Internal(format!(
                "unknown seat status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Journey
// ============================================================================

/// Ordered sequence of 1–3 flights satisfying the layover and
/// connectivity rules, materialised by the precomputer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
    /// Unique journey identifier.
    pub id: JourneyId,
    /// Flight ids in travel order. Order is positional.
    pub legs: SmallVec<[FlightId; 3]>,
    /// First leg's source airport.
    pub source_airport: AirportCode,
    /// Last leg's destination airport, distinct from the source.
    pub destination_airport: AirportCode,
    /// First leg's departure instant.
    pub departure: DateTime<Utc>,
    /// Last leg's arrival instant.
    pub arrival: DateTime<Utc>,
    /// Sum of leg prices.
    pub total_price: Money,
    /// Lifecycle status.
    pub status: JourneyStatus,
}

impl Journey {
    /// Uniqueness key: the ordered flight-id tuple.
    #[must_use]
    pub fn signature(&self) -> String {
        signature_of(&self.legs)
    }

    /// End-to-end travel time.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.arrival - self.departure
    }
}

/// Concatenate flight ids in order into the journey uniqueness key.
#[must_use]
pub fn signature_of(legs: &[FlightId]) -> String {
    legs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(":")
}

/// Journey lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JourneyStatus {
    /// Visible to search and bookable.
    Active,
    /// Retired; kept for referential integrity of old bookings.
    Inactive,
}

impl JourneyStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    /// Parse a status from its database string.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Internal`] for an unknown status string.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(DomainError::Internal(format!(
                "unknown journey status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Booking
// ============================================================================

/// A passenger booking over one journey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// User who booked.
    pub user_id: UserId,
    /// Journey booked.
    pub journey_id: JourneyId,
    /// Passengers covered, 1–10.
    pub passenger_count: u32,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Opaque payment reference.
    pub payment_id: PaymentId,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
}

/// Booking status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created; seat commit in flight.
    Reserved,
    /// Seats durably committed.
    Confirmed,
    /// Aborted before commit.
    Cancelled,
    /// Refunded after confirmation.
    Refunded,
}

impl BookingStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Parse a status from its database string.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Internal`] for an unknown status string.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "RESERVED" => Ok(Self::Reserved),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(DomainError::Internal(format!(
                "unknown booking status: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn airport_code_uppercases_and_validates() {
        assert_eq!(AirportCode::parse("lhr").unwrap().as_str(), "LHR");
        assert!(AirportCode::parse("LHRX").is_err());
        assert!(AirportCode::parse("L1R").is_err());
        assert!(AirportCode::parse("").is_err());
    }

    #[test]
    fn airport_code_rejects_invalid_on_deserialize() {
        let ok: Result<AirportCode, _> = serde_json::from_str("\"JFK\"");
        assert!(ok.is_ok());
        let bad: Result<AirportCode, _> = serde_json::from_str("\"J2K\"");
        assert!(bad.is_err());
    }

    #[test]
    fn money_formats_cents() {
        assert_eq!(Money::from_cents(12_345).to_string(), "$123.45");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }

    #[test]
    fn money_saturating_sum_does_not_wrap() {
        let total = Money::saturating_sum([Money::from_cents(u64::MAX), Money::from_cents(10)]);
        assert_eq!(total.cents(), u64::MAX);
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            SeatStatus::Available,
            SeatStatus::Reserved,
            SeatStatus::Booked,
            SeatStatus::Blocked,
        ] {
            assert_eq!(SeatStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(SeatStatus::parse("SOLD").is_err());
    }

    #[test]
    fn signature_preserves_leg_order() {
        let a = FlightId::new();
        let b = FlightId::new();
        assert_ne!(signature_of(&[a, b]), signature_of(&[b, a]));
        assert_eq!(signature_of(&[a]), a.to_string());
    }
}
