//! Hold janitor task.
//!
//! Reserve evicts expired holds inline and the per-flight key has its own
//! TTL, so this sweep is opportunistic: it keeps hot flights from carrying
//! dead members between bookings and gives an operator a log line to watch.

use crate::state::AppState;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn the periodic hold sweep.
pub fn spawn_hold_janitor(
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_secs(state.config.tasks.janitor_interval_secs.max(1));
        tracing::info!(sweep_secs = interval.as_secs(), "Hold janitor started");

        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Hold janitor shutting down");
                    return;
                }
            }

            match state.holds.cleanup_all().await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "Swept expired seat holds");
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(%error, "Hold sweep failed");
                }
            }
        }
    })
}
