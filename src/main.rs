//! # Room Mirror
//!
//! Read-only mirror of public Matrix rooms.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Homeserver gateway and room registry
//! - Background forward sync and directory refresh
//! - HTTP server

use anyhow::Result;
use tracing::info;

use room_mirror::config::Settings;
use room_mirror::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    room_mirror::telemetry::init_tracing();

    info!("Starting Room Mirror...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        homeserver = %settings.matrix.homeserver_url,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
