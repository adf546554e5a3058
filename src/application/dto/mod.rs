//! Data Transfer Objects
//!
//! DTOs for query parsing and JSON response bodies.

pub mod request;
pub mod response;

pub use request::{PageQuery, TimelineQuery};
pub use response::{
    EventResponse, MemberInfoResponse, MemberResponse, MembersResponse, PowerLevelsResponse,
    PublicRoomsResponse, RoomResponse, ServersResponse, TimelineResponse,
};
