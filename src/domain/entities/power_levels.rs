//! Room power levels.
//!
//! The mapping of actions to required levels, plus per-user overrides,
//! decoded from the `m.room.power_levels` state event.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn fifty() -> i64 {
    50
}

/// Authorization thresholds for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerLevels {
    #[serde(default = "fifty")]
    pub ban: i64,

    #[serde(default = "fifty")]
    pub kick: i64,

    #[serde(default = "fifty")]
    pub invite: i64,

    #[serde(default = "fifty")]
    pub redact: i64,

    /// Level required to send message events not listed in `events`
    #[serde(default)]
    pub events_default: i64,

    /// Level required to send state events not listed in `events`
    #[serde(default = "fifty")]
    pub state_default: i64,

    /// Level of users not listed in `users`
    #[serde(default)]
    pub users_default: i64,

    /// Per event type overrides
    #[serde(default)]
    pub events: BTreeMap<String, i64>,

    /// Per user overrides
    #[serde(default)]
    pub users: BTreeMap<String, i64>,
}

impl Default for PowerLevels {
    fn default() -> Self {
        Self {
            ban: 50,
            kick: 50,
            invite: 50,
            redact: 50,
            events_default: 0,
            state_default: 50,
            users_default: 0,
            events: BTreeMap::new(),
            users: BTreeMap::new(),
        }
    }
}

impl PowerLevels {
    /// Decode from event content, falling back to defaults for a malformed payload.
    pub fn from_content(content: &serde_json::Value) -> Self {
        serde_json::from_value(content.clone()).unwrap_or_default()
    }

    /// Effective level of a user.
    pub fn user_level(&self, user_id: &str) -> i64 {
        self.users
            .get(user_id)
            .copied()
            .unwrap_or(self.users_default)
    }

    /// Level required to send an event of the given type.
    pub fn event_level(&self, event_type: &str, is_state: bool) -> i64 {
        self.events.get(event_type).copied().unwrap_or(if is_state {
            self.state_default
        } else {
            self.events_default
        })
    }
}
