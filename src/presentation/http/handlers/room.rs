//! Room Handlers
//!
//! Views over a single mirrored room. Every handler takes a `LoadedRoom`,
//! so the mirror is initialized before the handler body runs.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::application::dto::{
    MemberInfoResponse, MemberResponse, MembersResponse, PageQuery, PowerLevelsResponse,
    RoomResponse, ServersResponse, TimelineQuery, TimelineResponse,
};
use crate::presentation::http::extractors::LoadedRoom;
use crate::shared::error::AppError;
use crate::shared::pagination::PageWindow;
use crate::startup::AppState;

/// GET /room/{room_id}/
pub async fn room_index(_: LoadedRoom) -> Redirect {
    Redirect::temporary("chat")
}

/// GET /room/{room_id}/chat?anchor=&offset=
pub async fn chat(
    State(state): State<AppState>,
    LoadedRoom(room): LoadedRoom,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<TimelineResponse>, AppError> {
    let page = room
        .get_event_page(
            query.anchor(),
            query.offset(),
            state.settings.pagination.timeline_page_size,
        )
        .await?;

    Ok(Json(TimelineResponse::new(RoomResponse::from_room(&room), page)))
}

/// GET /room/{room_id}/members?page=N
pub async fn members(
    State(state): State<AppState>,
    LoadedRoom(room): LoadedRoom,
    Query(query): Query<PageQuery>,
) -> Result<Json<MembersResponse>, AppError> {
    let all = room.get_members()?;
    let window = PageWindow::new(query.page(), state.settings.pagination.members_page_size);

    Ok(Json(MembersResponse {
        room: RoomResponse::from_room(&room),
        members: window
            .slice(&all)
            .into_iter()
            .map(MemberResponse::from)
            .collect(),
        page: window.page,
        total: all.len(),
    }))
}

/// GET /room/{room_id}/members/{user_id}
pub async fn member(
    LoadedRoom(room): LoadedRoom,
    Path((_, user_id)): Path<(String, String)>,
) -> Result<Json<MemberInfoResponse>, AppError> {
    let member = room
        .get_member(&user_id)?
        .ok_or_else(|| AppError::NotFound("Member Not Found".into()))?;

    Ok(Json(MemberInfoResponse {
        room: RoomResponse::from_room(&room),
        member: member.into(),
    }))
}

/// GET /room/{room_id}/power_levels
pub async fn power_levels(
    LoadedRoom(room): LoadedRoom,
) -> Result<Json<PowerLevelsResponse>, AppError> {
    Ok(Json(PowerLevelsResponse {
        power_levels: room.power_levels()?,
        room: RoomResponse::from_room(&room),
    }))
}

/// GET /room/{room_id}/servers
pub async fn servers(LoadedRoom(room): LoadedRoom) -> Result<Json<ServersResponse>, AppError> {
    Ok(Json(ServersResponse {
        servers: room.servers()?,
        room: RoomResponse::from_room(&room),
    }))
}
