//! # Axum Helpers
//!
//! Server plumbing shared by the HTTP apps in this workspace.
//!
//! ## Modules
//!
//! - **[`server`]**: Router layering, liveness/readiness endpoints, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::{app_info, server::{CorsConfig, ServerConfig}};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let routes = Router::new().merge(health_router(app_info!()));
//!     let app = create_router(routes, &CorsConfig::default())?;
//!
//!     create_production_app(app, &ServerConfig::default(), Duration::from_secs(30), async {}).await
//! }
//! ```

pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};
