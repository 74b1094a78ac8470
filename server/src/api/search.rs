//! Passenger search endpoint.
//!
//! `GET /search/journeys?sourceAirport&destinationAirport&departureDate
//! &passengers&sortBy&limit`

use crate::error::AppError;
use crate::services::search::{self, JourneyMatch, SearchQuery, SortBy};
use crate::state::AppState;
use aerobook_core::types::AirportCode;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for journey search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Departure airport code.
    pub source_airport: String,
    /// Arrival airport code.
    pub destination_airport: String,
    /// Departure day, `YYYY-MM-DD` (UTC).
    pub departure_date: String,
    /// Passengers that must fit; defaults to 1.
    pub passengers: Option<u32>,
    /// `price` or `duration`; omitted = catalogue order.
    pub sort_by: Option<String>,
    /// Maximum results; defaults to the configured limit.
    pub limit: Option<usize>,
}

/// One leg of a journey on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegResponse {
    /// Flight id.
    pub flight_id: Uuid,
    /// 1-based position within the journey.
    pub order: u32,
}

/// One journey on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResponse {
    /// Journey id.
    pub journey_id: Uuid,
    /// Departure airport code.
    pub source_airport: String,
    /// Arrival airport code.
    pub destination_airport: String,
    /// Departure, RFC 3339 UTC.
    pub departure_time: String,
    /// Arrival, RFC 3339 UTC.
    pub arrival_time: String,
    /// Total price, in currency units.
    pub total_price: f64,
    /// Seats bookable across all legs.
    pub available_seats: u32,
    /// Legs in travel order.
    pub legs: Vec<LegResponse>,
}

impl From<&JourneyMatch> for JourneyResponse {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn from(m: &JourneyMatch) -> Self {
        Self {
            journey_id: *m.journey.id.as_uuid(),
            source_airport: m.journey.source_airport.to_string(),
            destination_airport: m.journey.destination_airport.to_string(),
            departure_time: m.journey.departure.to_rfc3339(),
            arrival_time: m.journey.arrival.to_rfc3339(),
            total_price: m.journey.total_price.cents() as f64 / 100.0,
            available_seats: m.available_seats,
            legs: m
                .journey
                .legs
                .iter()
                .enumerate()
                .map(|(index, flight_id)| LegResponse {
                    flight_id: *flight_id.as_uuid(),
                    order: index as u32 + 1,
                })
                .collect(),
        }
    }
}

/// Search response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Matches, in requested order, truncated to the limit.
    pub journeys: Vec<JourneyResponse>,
    /// Total matches before truncation.
    pub total_count: usize,
}

/// `GET /search/journeys`
///
/// # Errors
///
/// 400 on invalid parameters, 5xx on store failure.
pub async fn search_journeys(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let source = AirportCode::parse(&params.source_airport).map_err(AppError::from)?;
    let destination = AirportCode::parse(&params.destination_airport).map_err(AppError::from)?;
    let date = NaiveDate::parse_from_str(&params.departure_date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("departureDate must be YYYY-MM-DD"))?;
    let sort_by = params
        .sort_by
        .as_deref()
        .map(SortBy::parse)
        .transpose()
        .map_err(AppError::from)?;

    let limit = params
        .limit
        .unwrap_or(state.config.search.default_limit)
        .clamp(1, state.config.search.max_limit);

    let outcome = search::search_journeys(
        &state,
        SearchQuery {
            source,
            destination,
            date,
            passengers: params.passengers.unwrap_or(1),
            sort_by,
            limit,
        },
    )
    .await?;

    Ok(Json(SearchResponse {
        journeys: outcome.matches.iter().map(JourneyResponse::from).collect(),
        total_count: outcome.total_count,
    }))
}
