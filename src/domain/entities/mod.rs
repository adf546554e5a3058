//! # Domain Entities
//!
//! Core objects mirrored from the remote homeserver.
//!
//! - **Event**: a single timeline or state event
//! - **MemberInfo**: a user's membership in a room
//! - **PowerLevels**: per-room authorization thresholds
//! - **RoomSummary**: name, topic and other descriptive state
//! - **PublicRoomEntry / DirectorySnapshot**: the public room directory

mod directory;
mod event;
mod member;
mod power_levels;
mod room_summary;

pub use directory::{DirectorySnapshot, PublicRoomEntry};
pub use event::{event_types, Event};
pub use member::{MemberInfo, Membership};
pub use power_levels::PowerLevels;
pub use room_summary::RoomSummary;
