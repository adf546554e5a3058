//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - The Matrix homeserver client (reqwest)
//! - Prometheus metrics

pub mod matrix;
pub mod metrics;
