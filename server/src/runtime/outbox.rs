//! Outbox publisher task.
//!
//! Polls `flight_event_outbox` for rows the ingest path failed to publish
//! (or published without marking, which only costs a duplicate delivery)
//! and pushes them onto the bus oldest-first. This is the reconciliation
//! path that makes "flight persisted, event lost" impossible to sustain.

use crate::state::AppState;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn the outbox publisher loop.
pub fn spawn_outbox_publisher(
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_secs(state.config.tasks.outbox_poll_secs.max(1));
        tracing::info!(poll_secs = interval.as_secs(), "Outbox publisher started");

        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Outbox publisher shutting down");
                    return;
                }
            }
            drain_once(&state).await;
        }
    })
}

/// Publish one batch of pending events; returns how many were published.
///
/// Errors are logged and stop the batch; the next tick retries from the
/// oldest pending row. A row published but not marked is redelivered,
/// which precomputation tolerates.
pub async fn drain_once(state: &AppState) -> usize {
    let pending = match state
        .outbox
        .fetch_pending(state.config.tasks.outbox_batch_size)
        .await
    {
        Ok(pending) => pending,
        Err(error) => {
            tracing::warn!(%error, "Outbox fetch failed");
            return 0;
        }
    };

    let mut published = 0;
    for row in pending {
        if let Err(error) = state.publisher.publish(&row.event).await {
            tracing::warn!(
                event_id = %row.event_id,
                %error,
                "Outbox publish failed; will retry next tick"
            );
            break;
        }
        if let Err(error) = state.outbox.mark_published(row.event_id).await {
            tracing::warn!(event_id = %row.event_id, %error, "Could not mark outbox row");
            break;
        }
        published += 1;
    }

    if published > 0 {
        tracing::info!(published, "Outbox drained");
    }
    published
}
