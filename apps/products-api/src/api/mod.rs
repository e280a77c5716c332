//! API routes module

pub mod health;

use axum::Router;
use axum_helpers::health_router;
use domain_products::{build_schema, handlers, AccessPolicy, ProductService};
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

/// Create all API routes: `/graphql`, `/health` and `/ready`
pub fn routes(state: &AppState) -> Router {
    let service = ProductService::new(Arc::clone(&state.store));
    let schema = build_schema(service, state.config.error_mode);
    info!(error_mode = ?schema.mode(), "GraphQL schema built");
    let policy = AccessPolicy::new(state.config.access.clone());

    handlers::router(schema, policy)
        .merge(health::router(state.clone()))
        .merge(health_router(state.config.app))
}
