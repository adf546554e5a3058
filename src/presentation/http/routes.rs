//! Route Configuration
//!
//! Configures all HTTP routes for the view.

use axum::{middleware, response::IntoResponse, routing::get, Router};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{create_view_headers_layer, track_metrics};
use crate::startup::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let cache_max_age = state.settings.scheduler.forward_sync_interval_secs;

    Router::new()
        .route("/", get(handlers::rooms::public_rooms))
        .merge(room_routes())
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        // Outermost, so every response gets the view headers
        .layer(create_view_headers_layer(cache_max_age))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [
            (
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            ),
            (axum::http::header::CACHE_CONTROL, "no-store"),
        ],
        metrics,
    )
}

/// Views over a single room
fn room_routes() -> Router<AppState> {
    Router::new()
        .route("/room/{room_id}/", get(handlers::room::room_index))
        .route("/room/{room_id}/chat", get(handlers::room::chat))
        .route("/room/{room_id}/members", get(handlers::room::members))
        .route("/room/{room_id}/members/{user_id}", get(handlers::room::member))
        .route("/room/{room_id}/power_levels", get(handlers::room::power_levels))
        .route("/room/{room_id}/servers", get(handlers::room::servers))
}
