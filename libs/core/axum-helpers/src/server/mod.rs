//! Server infrastructure module.
//!
//! This module provides:
//! - Router layering (tracing, CORS, compression, 404 fallback)
//! - Health and readiness endpoints
//! - Graceful shutdown coordination
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::{app_info, server::{CorsConfig, ServerConfig}};
//!
//! let routes = api_routes.merge(health_router(app_info!()));
//! let app = create_router(routes, &CorsConfig::default())?;
//!
//! create_production_app(app, &ServerConfig::default(), Duration::from_secs(30), async {}).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
