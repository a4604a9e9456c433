//! Gateway server setup
//!
//! Provides the main WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use collab_common::{AppConfig, AppError, CorsConfig, HubConfig, InMemoryRevocationList, JwtService};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router(hub: &HubConfig) -> Router<GatewayState> {
    Router::new()
        .route(&hub.document_path(), get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// CORS policy for browser clients
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let cors = cors_layer(&state.config().cors);

    create_router(&state.config().hub)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create `GatewayState` with the configured JWT validator
///
/// Revocation is backed by an in-process list; a deployment that shares a
/// blacklist with the issuer injects its own through [`GatewayState::new`].
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let jwt_service = Arc::new(JwtService::from_config(&config.jwt));
    let revocations = Arc::new(InMemoryRevocationList::new());

    GatewayState::new(config, jwt_service, revocations)
}

/// Serve the application on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(AppError::internal)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr, hub: &HubConfig) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}{}", addr, hub.document_path());

    serve(listener, app, shutdown_signal()).await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;
    let hub = config.hub.clone();

    // Create gateway state
    let state = create_gateway_state(config);

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, addr, &hub).await
}
