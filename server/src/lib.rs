//! HTTP surface and orchestration for the Aerobook flight booking backend.
//!
//! This crate wires the domain core to its stores and exposes the four
//! public endpoints plus health checks:
//!
//! - `POST /admin/flights`: validate, persist flight + seats, publish
//! - `GET /search/journeys`: cached catalogue read with availability
//! - `POST /bookings`: reserve, durably commit, release
//! - `GET /bookings/{id}`: booking read-back with seat assignments
//!
//! Long-running work (the journey precomputer consumers, the outbox
//! publisher, the hold janitor) lives in [`runtime`] and is spawned by the
//! server binary alongside the listener.

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
