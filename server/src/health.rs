//! Health and readiness endpoints.
//!
//! `/health` is process liveness only. `/ready` pings the stores a request
//! would actually touch: Postgres and Redis. The event broker is excluded
//! on purpose; the outbox absorbs broker outages, so a down broker should
//! not take the API out of rotation.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Liveness/readiness response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: `ok` or `degraded`.
    pub status: &'static str,
    /// Per-dependency status, present on readiness checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// Per-dependency readiness.
#[derive(Debug, Serialize)]
pub struct Components {
    /// Relational store reachability.
    pub postgres: &'static str,
    /// Lock store reachability.
    pub redis: &'static str,
}

/// `GET /health`: process is up.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        components: None,
    })
}

/// `GET /ready`: dependencies are reachable.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let postgres_ok = aerobook_postgres::ping(&state.pool).await.is_ok();
    let redis_ok = aerobook_redis::ping(&state.lock_conn).await.is_ok();

    let ready = postgres_ok && redis_ok;
    let response = HealthResponse {
        status: if ready { "ok" } else { "degraded" },
        components: Some(Components {
            postgres: if postgres_ok { "up" } else { "down" },
            redis: if redis_ok { "up" } else { "down" },
        }),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
