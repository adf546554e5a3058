//! Health Check Handlers
//!
//! Provides health check endpoints for Kubernetes-style liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (is there a directory to serve?)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::domain::DirectorySnapshot;
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health check response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub directory: DirectoryHealth,
    pub rooms: RoomsHealth,
}

/// Public directory cache health
#[derive(Debug, Serialize)]
pub struct DirectoryHealth {
    pub status: HealthStatus,
    pub rooms: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoomsHealth {
    pub known: usize,
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe - checks if the server is running
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe
/// Returns 200 once a directory snapshot exists, 503 before that
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();
    let started_at = SERVER_START_TIME.to_rfc3339();

    let directory = check_directory(
        &state.registry.public_rooms(),
        state.settings.scheduler.directory_refresh_interval_secs,
        Utc::now(),
    );
    let overall_status = directory.status;

    let response = DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime,
        started_at,
        checks: HealthChecks {
            directory,
            rooms: RoomsHealth {
                known: state.registry.room_count(),
            },
        },
    };

    // Return 503 if unhealthy
    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Never loaded is unhealthy; two missed refresh ticks is degraded.
fn check_directory(
    snapshot: &DirectorySnapshot,
    refresh_interval_secs: u64,
    now: DateTime<Utc>,
) -> DirectoryHealth {
    let Some(refreshed_at) = snapshot.refreshed_at else {
        return DirectoryHealth {
            status: HealthStatus::Unhealthy,
            rooms: 0,
            age_seconds: None,
            message: Some("Public room directory has not been loaded".into()),
        };
    };

    let age = (now - refreshed_at).num_seconds().max(0);
    let stale = u64::try_from(age).unwrap_or(0) > refresh_interval_secs.saturating_mul(2);

    DirectoryHealth {
        status: if stale {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        },
        rooms: snapshot.entries.len(),
        age_seconds: Some(age),
        message: stale.then(|| "Public room directory refresh is overdue".to_owned()),
    }
}
