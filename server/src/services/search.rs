//! Passenger search over the precomputed journey catalogue.
//!
//! The catalogue read is cached per (source, destination, date); seat
//! availability is recomputed on every request because it changes with
//! every booking, which is also why bookings never invalidate the cache.
//! Sorting is deterministic: ties break on journey id so paging is stable.

use crate::state::AppState;
use aerobook_core::types::{AirportCode, FlightId, Journey};
use aerobook_core::DomainError;
use chrono::NaiveDate;

/// Requested result ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortBy {
    /// Total price ascending.
    Price,
    /// `arrival - departure` ascending.
    Duration,
}

impl SortBy {
    /// Parse the `sortBy` query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for anything other than
    /// `price` or `duration`.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "price" => Ok(Self::Price),
            "duration" => Ok(Self::Duration),
            other => Err(DomainError::Validation(format!(
                "sortBy must be 'price' or 'duration', got {other:?}"
            ))),
        }
    }
}

/// A validated search query.
#[derive(Clone, Debug)]
pub struct SearchQuery {
    /// Departure airport.
    pub source: AirportCode,
    /// Arrival airport.
    pub destination: AirportCode,
    /// UTC departure day.
    pub date: NaiveDate,
    /// Passengers that must fit on every leg.
    pub passengers: u32,
    /// Result ordering; `None` leaves the catalogue order.
    pub sort_by: Option<SortBy>,
    /// Maximum results to return.
    pub limit: usize,
}

/// One journey the passenger could book.
#[derive(Clone, Debug)]
pub struct JourneyMatch {
    /// The journey.
    pub journey: Journey,
    /// Seats bookable across all legs (minimum over legs).
    pub available_seats: u32,
}

/// Search result: the first `limit` matches plus the total match count.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Matches in requested order, truncated to the limit.
    pub matches: Vec<JourneyMatch>,
    /// Matches before truncation.
    pub total_count: usize,
}

/// Run a search.
///
/// # Errors
///
/// Returns [`DomainError::Validation`] for a bad query, otherwise store
/// errors. A cache failure is not an error: the catalogue falls back to
/// the relational store.
pub async fn search_journeys(
    state: &AppState,
    query: SearchQuery,
) -> Result<SearchOutcome, DomainError> {
    if query.source == query.destination {
        return Err(DomainError::Validation(
            "source and destination airports must differ".to_string(),
        ));
    }
    if query.passengers == 0 || query.passengers > state.config.booking.max_passengers {
        return Err(DomainError::Validation(format!(
            "passengers must be between 1 and {}",
            state.config.booking.max_passengers
        )));
    }

    let journeys = load_catalogue(state, &query).await?;

    // Availability is computed post-cache, per request.
    let mut flight_ids: Vec<FlightId> = journeys.iter().flat_map(|j| j.legs.clone()).collect();
    flight_ids.sort_unstable();
    flight_ids.dedup();
    let counts = if flight_ids.is_empty() {
        std::collections::HashMap::new()
    } else {
        state.seats.count_available(&flight_ids).await?
    };

    let mut matches: Vec<JourneyMatch> = journeys
        .into_iter()
        .map(|journey| {
            let available_seats = journey
                .legs
                .iter()
                .map(|leg| counts.get(leg).copied().unwrap_or(0))
                .min()
                .unwrap_or(0);
            JourneyMatch {
                journey,
                available_seats,
            }
        })
        .filter(|m| m.available_seats >= query.passengers)
        .collect();

    sort_matches(&mut matches, query.sort_by);

    let total_count = matches.len();
    matches.truncate(query.limit);

    Ok(SearchOutcome {
        matches,
        total_count,
    })
}

/// Order matches by the requested key, ties broken by journey id so that
/// paging is deterministic. `None` keeps the catalogue (departure) order.
pub fn sort_matches(matches: &mut [JourneyMatch], sort_by: Option<SortBy>) {
    match sort_by {
        Some(SortBy::Price) => {
            matches.sort_by_key(|m| (m.journey.total_price, m.journey.id));
        }
        Some(SortBy::Duration) => {
            matches.sort_by_key(|m| (m.journey.duration(), m.journey.id));
        }
        None => {}
    }
}

async fn load_catalogue(state: &AppState, query: &SearchQuery) -> Result<Vec<Journey>, DomainError> {
    let source = query.source.as_str();
    let destination = query.destination.as_str();

    match state.cache.get(source, destination, query.date).await {
        Ok(Some(journeys)) => return Ok(journeys),
        Ok(None) => {}
        Err(error) => {
            tracing::warn!(%error, "Search cache read failed; falling back to store");
        }
    }

    let journeys = state
        .journeys
        .search_active(source, destination, query.date)
        .await?;

    if let Err(error) = state
        .cache
        .put(
            source,
            destination,
            query.date,
            &journeys,
            state.config.cache_ttl(),
        )
        .await
    {
        tracing::warn!(%error, "Search cache write failed");
    }

    Ok(journeys)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use aerobook_core::types::{JourneyId, JourneyStatus, Money};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn journey(id_byte: u128, price_cents: u64, duration_minutes: i64) -> JourneyMatch {
        let departure = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        JourneyMatch {
            journey: Journey {
                id: JourneyId::from_uuid(Uuid::from_u128(id_byte)),
                legs: [FlightId::new()].into_iter().collect(),
                source_airport: AirportCode::parse("JFK").unwrap(),
                destination_airport: AirportCode::parse("LAX").unwrap(),
                departure,
                arrival: departure + Duration::minutes(duration_minutes),
                total_price: Money::from_cents(price_cents),
                status: JourneyStatus::Active,
            },
            available_seats: 5,
        }
    }

    #[test]
    fn price_sort_breaks_ties_by_journey_id() {
        // Prices {100, 200, 100}, durations {180, 120, 150}.
        let mut matches = vec![
            journey(2, 10_000, 180),
            journey(3, 20_000, 120),
            journey(1, 10_000, 150),
        ];

        sort_matches(&mut matches, Some(SortBy::Price));
        let ids: Vec<JourneyId> = matches.iter().map(|m| m.journey.id).collect();
        assert_eq!(
            ids,
            vec![
                JourneyId::from_uuid(Uuid::from_u128(1)), // 100, lower id
                JourneyId::from_uuid(Uuid::from_u128(2)), // 100, higher id
                JourneyId::from_uuid(Uuid::from_u128(3)), // 200
            ]
        );
    }

    #[test]
    fn duration_sort_is_ascending() {
        let mut matches = vec![
            journey(2, 10_000, 180),
            journey(3, 20_000, 120),
            journey(1, 10_000, 150),
        ];

        sort_matches(&mut matches, Some(SortBy::Duration));
        let durations: Vec<i64> = matches
            .iter()
            .map(|m| m.journey.duration().num_minutes())
            .collect();
        assert_eq!(durations, vec![120, 150, 180]);
    }

    #[test]
    fn unsorted_keeps_incoming_order() {
        let mut matches = vec![journey(9, 30_000, 60), journey(1, 10_000, 90)];
        sort_matches(&mut matches, None);
        assert_eq!(matches[0].journey.id, JourneyId::from_uuid(Uuid::from_u128(9)));
    }

    #[test]
    fn sort_by_parses_the_wire_values() {
        assert_eq!(SortBy::parse("price").unwrap(), SortBy::Price);
        assert_eq!(SortBy::parse("duration").unwrap(), SortBy::Duration);
        assert!(SortBy::parse("fastest").is_err());
    }
}
