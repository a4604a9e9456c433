//! Collaboration Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p collab-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use collab_common::{try_init_tracing_with_config, AppConfig, Environment, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    let env = std::env::var("APP_ENV")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(Environment::Development);
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    // Run the server
    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Collaboration Gateway Server...");

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        port = config.gateway.port,
        hub_path = %config.hub.document_path(),
        skip_revocation_check = config.hub.skip_revocation_check,
        "Configuration loaded"
    );

    // Run the gateway server
    collab_gateway::run(config).await?;

    Ok(())
}
