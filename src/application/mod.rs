//! Application Layer
//!
//! The room mirror, its registry and background refresh, plus the DTOs the
//! presentation layer serializes. This layer sits between the HTTP view and
//! the domain/gateway contract.

pub mod services;
pub mod dto;
