//! Client-server API wire types.
//!
//! Only the fields the mirror reads are modelled; everything else is ignored.

use serde::Deserialize;
use tracing::warn;

use crate::domain::{Event, PublicRoomEntry};
use crate::infrastructure::metrics;

/// Error body returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct MatrixErrorBody {
    #[serde(default)]
    pub errcode: String,
    #[serde(default)]
    pub error: String,
}

/// A pagination chunk of raw events.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationChunk {
    #[serde(default)]
    pub chunk: Vec<serde_json::Value>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// `GET /rooms/{roomId}/initialSync`
#[derive(Debug, Deserialize)]
pub struct RoomInitialSyncResponse {
    #[serde(default)]
    pub messages: PaginationChunk,
    #[serde(default)]
    pub state: Vec<serde_json::Value>,
}

/// `GET /rooms/{roomId}/context/{eventId}`
#[derive(Debug, Deserialize)]
pub struct EventContextResponse {
    /// Newest first
    #[serde(default)]
    pub events_before: Vec<serde_json::Value>,
}

/// `GET /rooms/{roomId}/members`
#[derive(Debug, Deserialize)]
pub struct MembersResponse {
    #[serde(default)]
    pub chunk: Vec<serde_json::Value>,
}

/// `GET /publicRooms`
#[derive(Debug, Deserialize)]
pub struct PublicRoomsResponse {
    #[serde(default)]
    pub chunk: Vec<PublicRoomEntry>,
    #[serde(default)]
    pub next_batch: Option<String>,
}

/// Decode raw events, dropping any that do not have the shape of a room event.
///
/// A dropped timeline event is a hole the mirror cannot page over, so every
/// drop is logged at warn and counted.
pub fn decode_events(raw: Vec<serde_json::Value>) -> Vec<Event> {
    raw.into_iter()
        .filter_map(|value| {
            let event_id = value
                .get("event_id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned);
            match serde_json::from_value::<Event>(value) {
                Ok(event) => Some(event),
                Err(err) => {
                    metrics::record_undecodable_event();
                    warn!(event_id = ?event_id, error = %err, "Dropping undecodable event");
                    None
                }
            }
        })
        .collect()
}
