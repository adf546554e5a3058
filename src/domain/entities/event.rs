//! Room event entity.
//!
//! Mirrors the client-server wire shape of a room event closely enough that
//! the gateway can deserialize straight into it.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Well-known event types the mirror interprets.
pub mod event_types {
    pub const CREATE: &str = "m.room.create";
    pub const MEMBER: &str = "m.room.member";
    pub const POWER_LEVELS: &str = "m.room.power_levels";
    pub const NAME: &str = "m.room.name";
    pub const TOPIC: &str = "m.room.topic";
    pub const AVATAR: &str = "m.room.avatar";
    pub const CANONICAL_ALIAS: &str = "m.room.canonical_alias";
    pub const JOIN_RULES: &str = "m.room.join_rules";
    pub const HISTORY_VISIBILITY: &str = "m.room.history_visibility";
    pub const MESSAGE: &str = "m.room.message";
}

/// A single room event.
///
/// Events are immutable once materialized in a room mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Globally unique event ID
    pub event_id: String,

    /// Event type (e.g. `m.room.message`)
    #[serde(rename = "type")]
    pub event_type: String,

    /// Present only on state events. The empty string is the room-wide key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,

    /// User ID of the sender
    pub sender: String,

    /// Milliseconds since the unix epoch on the originating server
    #[serde(default)]
    pub origin_server_ts: i64,

    /// Opaque event payload
    #[serde(default)]
    pub content: serde_json::Value,
}

impl Event {
    /// Whether this is a state event.
    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }

    /// Whether this is the room's defining creation event.
    pub fn is_room_create(&self) -> bool {
        self.event_type == event_types::CREATE && self.state_key.as_deref() == Some("")
    }

    /// Origin timestamp as a UTC datetime, if representable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.origin_server_ts).single()
    }

    /// Read a string field out of the content payload.
    pub fn content_str(&self, field: &str) -> Option<&str> {
        self.content.get(field).and_then(|v| v.as_str())
    }
}
