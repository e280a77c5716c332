use super::shutdown::{ShutdownCoordinator, coordinated_shutdown};
use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, Uri, header},
    response::IntoResponse,
};
use core_config::server::{CorsConfig, ServerConfig};
use serde_json::json;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// JSON 404 for any route the app does not serve
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": format!("No route for {}", uri.path()),
        })),
    )
}

fn cors_layer(cors: &CorsConfig) -> io::Result<CorsLayer> {
    let origins = cors
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600)))
}

/// Wraps `routes` with the cross-cutting layers every app gets.
///
/// - HTTP tracing spans at INFO
/// - CORS, only when `cors` lists at least one origin
/// - Response compression negotiated from `Accept-Encoding`
/// - JSON 404 fallback
///
/// Routes should already have their state applied.
///
/// # Errors
/// Returns an error if an allowed origin is not a valid header value.
///
/// # Example
/// ```ignore
/// let routes = Router::new()
///     .route("/graphql", post(handler))
///     .with_state(state);
///
/// let router = create_router(routes, &CorsConfig::from_env()?)?;
/// ```
pub fn create_router(routes: Router, cors: &CorsConfig) -> io::Result<Router> {
    let mut router = routes.fallback(not_found).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    if cors.is_enabled() {
        info!(origins = ?cors.allowed_origins, "CORS enabled");
        router = router.layer(cors_layer(cors)?);
    } else {
        info!("CORS_ALLOWED_ORIGIN not set, CORS disabled");
    }

    Ok(router.layer(CompressionLayer::new()))
}

/// Production server with coordinated shutdown and cleanup.
///
/// Once a shutdown signal arrives the server stops accepting connections and
/// `cleanup` runs, bounded by `shutdown_timeout`.
///
/// # Example
/// ```ignore
/// let cleanup = async move {
///     client.shutdown().await;
/// };
///
/// create_production_app(router, &config, Duration::from_secs(30), cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, mut shutdown_rx) = ShutdownCoordinator::new();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        let _ = shutdown_rx.recv().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(_) => info!("Cleanup completed successfully"),
            Err(_) => {
                tracing::warn!(
                    "Cleanup exceeded timeout of {:?}, forcing shutdown",
                    shutdown_timeout
                );
            }
        }
    });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(coordinated_shutdown(coordinator.clone()))
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    // A server error skips the signal path, so release the cleanup task here.
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}
