//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::compression::CompressionLayer;

use crate::application::services::{spawn_directory_refresh, spawn_forward_sync, RoomRegistry};
use crate::config::Settings;
use crate::domain::RoomGateway;
use crate::infrastructure::matrix::MatrixGateway;
use crate::presentation::http::{handlers::health, routes};
use crate::presentation::middleware::{cors, logging};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Registry over `gateway`, tuned by `settings`
    pub fn new(gateway: Arc<dyn RoomGateway>, settings: Settings) -> Self {
        let registry = RoomRegistry::new(
            gateway,
            settings.mirror.options(),
            settings.scheduler.directory_freshness(),
        );
        Self {
            registry: Arc::new(registry),
            settings: Arc::new(settings),
        }
    }
}

/// Full router with HTTP middleware applied
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .layer(CompressionLayer::new())
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    background: Vec<JoinHandle<()>>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let gateway = MatrixGateway::new(&settings.matrix)
            .context("Failed to create homeserver gateway")?;
        tracing::info!(homeserver = %settings.matrix.homeserver_url, "Homeserver gateway created");

        let state = AppState::new(Arc::new(gateway), settings.clone());

        // A failed first load is retried by the refresh loop.
        if let Err(err) = state.registry.load_public_rooms(true).await {
            tracing::warn!(error = %err, "Initial public room directory load failed");
        }

        let background = vec![
            spawn_forward_sync(
                Arc::clone(&state.registry),
                settings.scheduler.forward_sync_interval(),
            ),
            spawn_directory_refresh(
                Arc::clone(&state.registry),
                settings.scheduler.directory_refresh_interval(),
            ),
        ];

        let router = build_router(state);

        let addr = settings.server_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            background,
        })
    }

    /// Run the server until Ctrl-C, then stop the background loops
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        for task in self.background {
            task.abort();
        }
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
