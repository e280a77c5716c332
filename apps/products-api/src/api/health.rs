//! Readiness endpoint

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use axum_helpers::{run_health_checks, HealthCheckFuture};

use crate::state::AppState;

/// Reports `"store": "connected"` when the selected provider answers its health check
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let store = &state.store;
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "store",
        Box::pin(async move { store.health_check().await.map_err(|e| e.to_string()) }),
    )];

    run_health_checks(checks).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
}
