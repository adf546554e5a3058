//! # Room Mirror Library
//!
//! A read-only, crawlable mirror of public Matrix rooms:
//! - Lazily synced per-room state (timeline, members, power levels)
//! - Anchor-based timeline pagination with on-demand backfill
//! - Background forward sync and public directory refresh
//! - JSON HTTP view over the cached state
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Matrix entities and the `RoomGateway` trait
//! - **Application Layer**: Room mirrors, the registry, the scheduler and DTOs
//! - **Infrastructure Layer**: Homeserver client and Prometheus metrics
//! - **Presentation Layer**: HTTP handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! room_mirror/
//! +-- config/         Configuration management
//! +-- domain/         Entities and the gateway trait
//! +-- application/    Mirror, registry, scheduler and DTOs
//! +-- infrastructure/ Matrix client and metrics
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Common utilities (errors, pagination)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core entities and gateway contract
pub mod domain;

// Application layer - Mirror services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
