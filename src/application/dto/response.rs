//! Response DTOs
//!
//! Data structures for the JSON view of mirrored rooms.

use serde::Serialize;

use crate::application::services::{EventPage, RoomMirror};
use crate::domain::{Event, MemberInfo, PowerLevels, PublicRoomEntry, RoomSummary};

/// Room header shared by every room view
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub room_id: String,
    pub display_name: String,
    pub topic: Option<String>,
    pub avatar_url: Option<String>,
    pub canonical_alias: Option<String>,
    pub join_rule: Option<String>,
    pub history_visibility: Option<String>,
}

impl RoomResponse {
    pub fn new(room_id: &str, summary: RoomSummary) -> Self {
        Self {
            room_id: room_id.to_owned(),
            display_name: summary.display_name(room_id).to_owned(),
            topic: summary.topic,
            avatar_url: summary.avatar_url,
            canonical_alias: summary.canonical_alias,
            join_rule: summary.join_rule,
            history_visibility: summary.history_visibility,
        }
    }

    pub fn from_room(room: &RoomMirror) -> Self {
        Self::new(room.id(), room.summary().unwrap_or_default())
    }
}

/// Public directory page
#[derive(Debug, Serialize)]
pub struct PublicRoomsResponse {
    pub rooms: Vec<PublicRoomEntry>,
    pub page: usize,
    pub total: usize,
}

/// Timeline event
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    pub sender: String,
    pub timestamp: Option<String>,
    pub content: serde_json::Value,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            timestamp: event.timestamp().map(|ts| ts.to_rfc3339()),
            event_id: event.event_id,
            event_type: event.event_type,
            state_key: event.state_key,
            sender: event.sender,
            content: event.content,
        }
    }
}

/// One page of a room's timeline
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub room: RoomResponse,
    /// Oldest first
    pub events: Vec<EventResponse>,
    pub page_size: usize,
    pub reached_room_create: bool,
    pub current_offset: usize,
    /// Anchor to keep paging against
    pub anchor: Option<String>,
}

impl TimelineResponse {
    pub fn new(room: RoomResponse, page: EventPage) -> Self {
        Self {
            room,
            reached_room_create: page.reached_room_create(),
            page_size: page.page_size,
            current_offset: page.offset,
            anchor: page.anchor,
            events: page.events.into_iter().map(EventResponse::from).collect(),
        }
    }
}

/// Member response
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub membership: &'static str,
    pub power_level: i64,
}

impl From<MemberInfo> for MemberResponse {
    fn from(member: MemberInfo) -> Self {
        Self {
            display_name: member.name().to_owned(),
            membership: member.membership.as_str(),
            user_id: member.user_id,
            avatar_url: member.avatar_url,
            power_level: member.power_level,
        }
    }
}

/// Member list page
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub room: RoomResponse,
    pub members: Vec<MemberResponse>,
    pub page: usize,
    pub total: usize,
}

/// Single member view
#[derive(Debug, Serialize)]
pub struct MemberInfoResponse {
    pub room: RoomResponse,
    pub member: MemberResponse,
}

/// Power levels view
#[derive(Debug, Serialize)]
pub struct PowerLevelsResponse {
    pub room: RoomResponse,
    pub power_levels: PowerLevels,
}

/// Servers participating in a room
#[derive(Debug, Serialize)]
pub struct ServersResponse {
    pub room: RoomResponse,
    pub servers: Vec<String>,
}
