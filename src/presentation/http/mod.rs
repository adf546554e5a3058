//! HTTP
//!
//! Routes, extractors and handlers for the JSON view.

pub mod extractors;
pub mod handlers;
pub mod routes;
