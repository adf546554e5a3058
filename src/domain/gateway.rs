//! Remote gateway contract.
//!
//! The mirror is the cache: nothing behind this trait is assumed to cache or
//! deduplicate requests. Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::entities::{Event, MemberInfo, PublicRoomEntry};

/// Errors surfaced by a gateway call.
///
/// `Clone` so a single sync outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote returned {status} ({errcode}): {message}")]
    Status {
        status: u16,
        errcode: String,
        message: String,
    },

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Full room state as returned by an initial sync.
#[derive(Debug, Clone, Default)]
pub struct RoomStateSnapshot {
    /// Current state events
    pub state: Vec<Event>,

    /// A recent timeline window, oldest first
    pub timeline: Vec<Event>,

    /// Opaque token to resume forward sync from
    pub cursor: String,
}

/// Events newer than a sync cursor.
#[derive(Debug, Clone, Default)]
pub struct NewEvents {
    /// New events, oldest first
    pub events: Vec<Event>,

    /// Cursor to use for the next forward sync
    pub cursor: String,
}

/// Client to the remote homeserver's API.
#[async_trait]
pub trait RoomGateway: Send + Sync {
    /// Fetch current state, a recent timeline window and a forward cursor.
    async fn fetch_room_state(&self, room_id: &str) -> Result<RoomStateSnapshot, GatewayError>;

    /// Fetch up to `count` events strictly older than `before_event_id`,
    /// newest first. An empty page means the start of history.
    async fn fetch_timeline_page(
        &self,
        room_id: &str,
        before_event_id: &str,
        count: usize,
    ) -> Result<Vec<Event>, GatewayError>;

    /// Fetch the room's member list.
    async fn fetch_members(&self, room_id: &str) -> Result<Vec<MemberInfo>, GatewayError>;

    /// Fetch the whole public room directory.
    async fn fetch_public_directory(&self) -> Result<Vec<PublicRoomEntry>, GatewayError>;

    /// Fetch events newer than `cursor`.
    async fn fetch_new_events_since(
        &self,
        room_id: &str,
        cursor: &str,
    ) -> Result<NewEvents, GatewayError>;
}
