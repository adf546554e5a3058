//! Room member entity.

use serde::{Deserialize, Serialize};

use super::event::Event;

/// Membership state of a user in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Join,
    Invite,
    #[default]
    Leave,
    Ban,
    Knock,
}

impl Membership {
    /// Parse the wire representation. Unknown values are treated as `leave`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "join" => Self::Join,
            "invite" => Self::Invite,
            "ban" => Self::Ban,
            "knock" => Self::Knock,
            _ => Self::Leave,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Invite => "invite",
            Self::Leave => "leave",
            Self::Ban => "ban",
            Self::Knock => "knock",
        }
    }
}

/// Cached information about one member of a room.
///
/// Mutated only by sync operations, never by read requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Fully qualified user ID (`@local:server`)
    pub user_id: String,

    /// Per-room display name
    pub display_name: Option<String>,

    /// Avatar content URI
    pub avatar_url: Option<String>,

    /// Current membership state
    pub membership: Membership,

    /// Effective power level in the room
    pub power_level: i64,
}

impl MemberInfo {
    /// Create a joined member with no profile data.
    pub fn new(user_id: impl Into<String>, membership: Membership) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            avatar_url: None,
            membership,
            power_level: 0,
        }
    }

    /// Build member info from an `m.room.member` state event.
    ///
    /// Returns `None` for events that are not membership events.
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.event_type != super::event_types::MEMBER {
            return None;
        }
        let user_id = event.state_key.clone()?;
        Some(Self {
            user_id,
            display_name: event.content_str("displayname").map(Into::into),
            avatar_url: event.content_str("avatar_url").map(Into::into),
            membership: Membership::from_str(event.content_str("membership").unwrap_or_default()),
            power_level: 0,
        })
    }

    /// Display name, falling back to the user ID.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }

    /// Homeserver part of the user ID.
    pub fn server_name(&self) -> Option<&str> {
        self.user_id.split_once(':').map(|(_, server)| server)
    }
}
