//! Presentation Layer
//!
//! Read-only HTTP view over the room registry.

pub mod http;
pub mod middleware;
