//! Router configuration.
//!
//! Builds the complete Axum router with the public endpoints, health
//! checks, request-id propagation, and per-request tracing.

use crate::api::{bookings, flights, search};
use crate::health::{health_check, readiness_check};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Admin ingest
        .route("/admin/flights", post(flights::create_flight))
        .route("/admin/flights/:id", get(flights::get_flight))
        // Passenger search
        .route("/search/journeys", get(search::search_journeys))
        // Booking
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/:id", get(bookings::get_booking))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
