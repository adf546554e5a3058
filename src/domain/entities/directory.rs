//! Public room directory entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the homeserver's public room directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRoomEntry {
    pub room_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub topic: Option<String>,

    #[serde(default)]
    pub canonical_alias: Option<String>,

    #[serde(default)]
    pub num_joined_members: u64,

    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub world_readable: bool,

    #[serde(default)]
    pub guest_can_join: bool,
}

/// A complete directory listing as of one refresh.
///
/// Snapshots are replaced wholesale, never patched in place.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub entries: Vec<PublicRoomEntry>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl DirectorySnapshot {
    pub fn new(entries: Vec<PublicRoomEntry>, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            entries,
            refreshed_at: Some(refreshed_at),
        }
    }

    /// Whether the snapshot was refreshed within `window` of `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.refreshed_at
            .is_some_and(|refreshed| now.signed_duration_since(refreshed) < window)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.room_id == room_id)
    }
}
