//! Room summary derived from room state.

use serde::{Deserialize, Serialize};

use super::event::{event_types, Event};

/// Descriptive room metadata, folded out of state events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: Option<String>,
    pub topic: Option<String>,
    pub avatar_url: Option<String>,
    pub canonical_alias: Option<String>,
    pub join_rule: Option<String>,
    pub history_visibility: Option<String>,
    pub creator: Option<String>,
}

impl RoomSummary {
    /// Fold a room-wide state event into the summary.
    ///
    /// Returns `true` if the event was recognised.
    pub fn apply(&mut self, event: &Event) -> bool {
        if event.state_key.as_deref() != Some("") {
            return false;
        }

        let owned = |field: &str| event.content_str(field).map(str::to_owned);
        match event.event_type.as_str() {
            event_types::NAME => self.name = owned("name"),
            event_types::TOPIC => self.topic = owned("topic"),
            event_types::AVATAR => self.avatar_url = owned("url"),
            event_types::CANONICAL_ALIAS => self.canonical_alias = owned("alias"),
            event_types::JOIN_RULES => self.join_rule = owned("join_rule"),
            event_types::HISTORY_VISIBILITY => {
                self.history_visibility = owned("history_visibility")
            }
            event_types::CREATE => {
                self.creator = owned("creator").or_else(|| Some(event.sender.clone()))
            }
            _ => return false,
        }
        true
    }

    /// Best human-readable label for the room.
    pub fn display_name<'a>(&'a self, room_id: &'a str) -> &'a str {
        self.name
            .as_deref()
            .or(self.canonical_alias.as_deref())
            .unwrap_or(room_id)
    }
}
