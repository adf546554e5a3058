//! Application Services
//!
//! The room-state mirror and the machinery that keeps it fresh.
//!
//! ## Available Services
//!
//! - **RoomMirror**: per-room cached state and anchor-based pagination
//! - **RoomRegistry**: all known mirrors plus the public directory cache
//! - **scheduler**: background forward-sync and directory refresh loops

pub mod registry;
pub mod room_mirror;
pub mod scheduler;
pub mod timeline;

pub use registry::RoomRegistry;
pub use room_mirror::{MirrorOptions, RoomError, RoomMirror, TimelineError};
pub use scheduler::{forward_sync_tick, spawn_directory_refresh, spawn_forward_sync};
pub use timeline::{into_display_order, EventPage};
