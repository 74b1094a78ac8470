//! Precomputer worker pool.
//!
//! Each worker is one consumer in the shared consumer group; the broker
//! assigns partitions across them, so every `flights.created` event is
//! processed by exactly one worker, to completion, before its offset is
//! committed.

use crate::services::precompute;
use crate::state::AppState;
use aerobook_core::DomainError;
use aerobook_redpanda::FlightEventConsumer;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn the configured number of precomputer workers.
///
/// # Errors
///
/// Returns [`DomainError::Internal`] if a consumer cannot be constructed
/// or subscribed.
pub fn spawn_precompute_workers(
    state: &AppState,
    shutdown: &broadcast::Sender<()>,
) -> Result<Vec<JoinHandle<()>>, DomainError> {
    let workers = state.config.redpanda.precompute_workers.max(1);
    let mut handles = Vec::with_capacity(workers);

    for worker in 0..workers {
        let consumer = FlightEventConsumer::new(
            &state.config.redpanda.brokers,
            &state.config.redpanda.consumer_group,
        )
        .map_err(|e| DomainError::Internal(format!("starting precompute worker {worker}: {e}")))?;

        let state = state.clone();
        let shutdown_rx = shutdown.subscribe();
        handles.push(tokio::spawn(async move {
            tracing::info!(worker, "Precompute worker started");
            consumer
                .run(
                    move |event| {
                        let state = state.clone();
                        async move { precompute::handle_flight_created(&state, event).await }
                    },
                    shutdown_rx,
                )
                .await;
            tracing::info!(worker, "Precompute worker stopped");
        }));
    }

    Ok(handles)
}
