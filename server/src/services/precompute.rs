//! Journey precomputation: the consumer-side handler for
//! `flights.created` events.
//!
//! One event is processed to completion here before the runtime commits
//! its offset. Everything is idempotent end to end: enumeration is a pure
//! function, persistence swallows signature conflicts, and invalidating an
//! already-clean cache route is a no-op, so redelivery converges on the
//! same journey set.

use crate::state::AppState;
use aerobook_core::event::FlightCreated;
use aerobook_core::journey::enumerate_journeys;
use aerobook_core::DomainError;
use std::collections::HashSet;

/// Handle one flight-created event.
///
/// Loads the flight and its same-day ACTIVE peers, enumerates every valid
/// journey through it, persists each candidate idempotently, and
/// invalidates the search cache for every route that gained a journey.
///
/// Per-journey persistence failures are logged and do not stop the sweep;
/// if any occurred the whole event errors so the runtime retries it
/// wholesale (idempotence makes the retry safe). An event for an unknown
/// flight is logged and dropped.
///
/// # Errors
///
/// Returns the first store error when loading, or an
/// [`DomainError::Internal`] summary when some journeys failed to persist.
pub async fn handle_flight_created(
    state: &AppState,
    event: FlightCreated,
) -> Result<(), DomainError> {
    let Some(flight) = state.flights.get(event.flight_id).await? else {
        tracing::warn!(
            flight_id = %event.flight_id,
            "Dropping event for unknown flight"
        );
        return Ok(());
    };

    let same_day = state.flights.list_active_on(flight.departure_date()).await?;
    let rules = state.config.journey_rules();
    let candidates = enumerate_journeys(&flight, &same_day, &rules);

    let mut created = 0usize;
    let mut failed = 0usize;
    let mut touched_routes: HashSet<(String, String)> = HashSet::new();

    for candidate in &candidates {
        match state.journeys.insert_if_absent(candidate).await {
            Ok(Some(journey_id)) => {
                created += 1;
                touched_routes.insert((
                    candidate.source_airport.as_str().to_string(),
                    candidate.destination_airport.as_str().to_string(),
                ));
                tracing::debug!(
                    %journey_id,
                    legs = candidate.legs.len(),
                    "Materialised journey"
                );
            }
            Ok(None) => {
                // Already present: redelivery or overlap with another event.
            }
            Err(error) => {
                failed += 1;
                tracing::error!(
                    signature = %candidate.signature(),
                    %error,
                    "Journey persistence failed"
                );
            }
        }
    }

    for (source, destination) in &touched_routes {
        if let Err(error) = state.cache.invalidate_route(source, destination).await {
            // Not fatal: the entry expires at cache TTL regardless.
            tracing::warn!(%source, %destination, %error, "Cache invalidation failed");
        }
    }

    tracing::info!(
        flight_id = %flight.id,
        enumerated = candidates.len(),
        created,
        failed,
        routes_invalidated = touched_routes.len(),
        "Processed flight-created event"
    );

    if failed > 0 {
        return Err(DomainError::Internal(format!(
            "{failed} of {} journeys failed to persist",
            candidates.len()
        )));
    }
    Ok(())
}
