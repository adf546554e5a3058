//! Middleware
//!
//! Tower middleware for request processing.

pub mod cors;
pub mod headers;
pub mod logging;

pub use headers::{create_view_headers_layer, ViewHeadersConfig, ViewHeadersLayer};
pub use logging::{create_trace_layer, track_metrics};
