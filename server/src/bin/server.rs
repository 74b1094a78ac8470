//! Aerobook server binary.
//!
//! Starts the HTTP listener and the background runtime (precompute worker
//! pool, outbox publisher, hold janitor) and shuts everything down
//! gracefully on ctrl-c.
//!
//! # Usage
//!
//! ```bash
//! # Start infrastructure
//! docker compose up -d
//!
//! # Run server
//! cargo run --bin server
//! ```

use aerobook_server::{build_router, runtime, AppState, Config};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aerobook_server=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        postgres = %config.postgres.url,
        redis = %config.redis.url,
        brokers = %config.redpanda.brokers,
        "Configuration loaded"
    );

    let state = AppState::initialise(config).await?;
    tracing::info!("Stores connected, migrations applied");

    let (shutdown_tx, _) = broadcast::channel(1);

    let mut task_handles = runtime::spawn_precompute_workers(&state, &shutdown_tx)?;
    task_handles.push(runtime::spawn_outbox_publisher(
        state.clone(),
        shutdown_tx.subscribe(),
    ));
    task_handles.push(runtime::spawn_hold_janitor(
        state.clone(),
        shutdown_tx.subscribe(),
    ));

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Aerobook server listening");

    // Translate ctrl-c into the shared shutdown signal.
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = signal_tx.send(());
        }
    });

    let mut serve_shutdown = shutdown_tx.subscribe();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            let _ = serve_shutdown.recv().await;
        })
        .await?;

    for handle in task_handles {
        let _ = handle.await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
