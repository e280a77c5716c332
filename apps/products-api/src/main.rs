//! Products API - GraphQL catalog server

use axum_helpers::server::{create_production_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::resolve_store;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(provider = %config.store.kind, "Selecting storage provider");
    let store = resolve_store(&config.store).await?;

    if !config.access.admin {
        info!("Catalog is read-only: every mutation will be denied");
    } else if config.access.admin_token.is_none() {
        warn!("CATALOG_ADMIN_TOKEN is not set: mutations are open to every caller");
    }

    let state = AppState::new(config, store);

    let routes = api::routes(&state);
    let app = create_router(routes, &state.config.cors)?;

    info!(
        "Starting Products API on {} (GraphQL at /graphql)",
        state.config.server.address()
    );

    let server_config = state.config.server.clone();
    create_production_app(app, &server_config, Duration::from_secs(30), async move {
        info!(
            provider = state.store.name(),
            "Shutting down: releasing storage provider"
        );
        drop(state);
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
