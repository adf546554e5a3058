//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Homeserver request counts and latency by operation
//! - Known room mirrors and public directory size
//! - Forward sync failures
//! - Homeserver events dropped as undecodable

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace("room_mirror"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace("room_mirror")
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Homeserver requests by operation and outcome ("ok" or "error")
pub static GATEWAY_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("gateway_requests_total", "Total number of homeserver requests")
            .namespace("room_mirror"),
        &["operation", "outcome"],
    )
    .expect("Failed to create GATEWAY_REQUESTS_TOTAL metric")
});

/// Homeserver request latency histogram
pub static GATEWAY_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];
    HistogramVec::new(
        HistogramOpts::new(
            "gateway_request_duration_seconds",
            "Homeserver request latency in seconds",
        )
        .namespace("room_mirror")
        .buckets(buckets),
        &["operation"],
    )
    .expect("Failed to create GATEWAY_REQUEST_DURATION_SECONDS metric")
});

/// Number of room mirrors held in memory
pub static KNOWN_ROOMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("known_rooms", "Number of mirrored rooms").namespace("room_mirror"),
    )
    .expect("Failed to create KNOWN_ROOMS metric")
});

/// Entries in the current public directory snapshot
pub static DIRECTORY_ROOMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("directory_rooms", "Rooms in the public directory snapshot")
            .namespace("room_mirror"),
    )
    .expect("Failed to create DIRECTORY_ROOMS metric")
});

/// Per-room forward sync failures
pub static FORWARD_SYNC_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("forward_sync_failures_total", "Failed per-room forward syncs")
            .namespace("room_mirror"),
    )
    .expect("Failed to create FORWARD_SYNC_FAILURES_TOTAL metric")
});

/// Events the homeserver returned that could not be decoded
pub static UNDECODABLE_EVENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("undecodable_events_total", "Homeserver events dropped as undecodable")
            .namespace("room_mirror"),
    )
    .expect("Failed to create UNDECODABLE_EVENTS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(GATEWAY_REQUESTS_TOTAL.clone()))
        .expect("Failed to register GATEWAY_REQUESTS_TOTAL");
    registry
        .register(Box::new(GATEWAY_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register GATEWAY_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(KNOWN_ROOMS.clone()))
        .expect("Failed to register KNOWN_ROOMS");
    registry
        .register(Box::new(DIRECTORY_ROOMS.clone()))
        .expect("Failed to register DIRECTORY_ROOMS");
    registry
        .register(Box::new(FORWARD_SYNC_FAILURES_TOTAL.clone()))
        .expect("Failed to register FORWARD_SYNC_FAILURES_TOTAL");
    registry
        .register(Box::new(UNDECODABLE_EVENTS_TOTAL.clone()))
        .expect("Failed to register UNDECODABLE_EVENTS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record a homeserver request
pub fn record_gateway_request(operation: &str, success: bool, duration_secs: f64) {
    let outcome = if success { "ok" } else { "error" };
    GATEWAY_REQUESTS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    GATEWAY_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration_secs);
}

pub fn set_known_rooms(count: usize) {
    KNOWN_ROOMS.set(count as i64);
}

pub fn set_directory_size(count: usize) {
    DIRECTORY_ROOMS.set(count as i64);
}

pub fn record_forward_sync_failure() {
    FORWARD_SYNC_FAILURES_TOTAL.inc();
}

pub fn record_undecodable_event() {
    UNDECODABLE_EVENTS_TOTAL.inc();
}
