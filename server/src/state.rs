//! Application state shared across HTTP handlers and background tasks.

use crate::config::Config;
use aerobook_core::DomainError;
use aerobook_postgres::{BookingStore, FlightStore, JourneyStore, OutboxStore, SeatStore};
use aerobook_redis::{SearchCache, SeatHoldStore};
use aerobook_redpanda::FlightEventPublisher;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared resources for handlers and background tasks.
///
/// Cloned per request; every field is cheap to clone (pools, managed
/// connections, `Arc`s).
#[derive(Clone)]
pub struct AppState {
    /// Flight store (writes also materialise seats and the outbox row).
    pub flights: FlightStore,
    /// Seat inventory reads.
    pub seats: SeatStore,
    /// Journey catalogue.
    pub journeys: JourneyStore,
    /// Booking commit and reads.
    pub bookings: BookingStore,
    /// Outbox drain for the publisher task.
    pub outbox: OutboxStore,
    /// Atomic seat holds.
    pub holds: SeatHoldStore,
    /// Search cache.
    pub cache: SearchCache,
    /// Direct event publisher (happy path; the outbox task is the backstop).
    pub publisher: FlightEventPublisher,
    /// Configuration.
    pub config: Arc<Config>,
    /// Raw pool, kept for readiness checks.
    pub pool: PgPool,
    /// Raw lock-store connection, kept for readiness checks.
    pub lock_conn: ConnectionManager,
}

impl AppState {
    /// Connect every backing store, run migrations, and assemble the state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::StoreUnavailable`] if Postgres or Redis cannot
    /// be reached, or [`DomainError::Internal`] if the event producer cannot
    /// be configured. The Kafka broker itself may be down at startup; the
    /// producer connects lazily and the outbox absorbs the gap.
    pub async fn initialise(config: Config) -> Result<Self, DomainError> {
        let pool = aerobook_postgres::connect(&config.postgres.url, config.postgres.max_connections)
            .await?;
        aerobook_postgres::run_migrations(&pool).await?;

        let lock_conn = aerobook_redis::connect(&config.redis.url).await?;

        let publisher = FlightEventPublisher::new(&config.redpanda.brokers)
            .map_err(|e| DomainError::Internal(format!("configuring event producer: {e}")))?;

        Ok(Self {
            flights: FlightStore::new(pool.clone()),
            seats: SeatStore::new(pool.clone()),
            journeys: JourneyStore::new(pool.clone()),
            bookings: BookingStore::new(pool.clone()),
            outbox: OutboxStore::new(pool.clone()),
            holds: SeatHoldStore::new(lock_conn.clone()),
            cache: SearchCache::new(lock_conn.clone()),
            publisher,
            config: Arc::new(config),
            pool,
            lock_conn,
        })
    }
}
