//! # Domain Layer
//!
//! The mirrored data model and the contract with the remote homeserver.
//!
//! ## Structure
//!
//! - **entities**: events, members, power levels, room summaries, directory entries
//! - **gateway**: the `RoomGateway` trait the mirror fetches through
//!
//! Nothing here depends on the infrastructure or presentation layers.

pub mod entities;
pub mod gateway;

// Re-export commonly used types
pub use entities::*;
pub use gateway::{GatewayError, NewEvents, RoomGateway, RoomStateSnapshot};
