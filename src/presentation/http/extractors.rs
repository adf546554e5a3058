//! Custom Extractors
//!
//! Axum extractors for resolving room mirrors from the request path.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    RequestPartsExt,
};

use crate::application::services::RoomMirror;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// A room mirror whose initial sync has completed.
///
/// Reads the `room_id` path parameter, registers the mirror if needed and
/// runs the lazy initial sync.
#[derive(Debug, Clone)]
pub struct LoadedRoom(pub Arc<RoomMirror>);

impl FromRequestParts<AppState> for LoadedRoom {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = parts
            .extract::<Path<HashMap<String, String>>>()
            .await
            .map_err(|_| AppError::BadRequest("Invalid room ID".into()))?;

        let room_id = params
            .get("room_id")
            .ok_or_else(|| AppError::Internal("route has no room_id parameter".into()))?;
        if !is_valid_room_id(room_id) {
            return Err(AppError::BadRequest("Invalid room ID".into()));
        }

        if state.settings.mirror.public_only && !state.registry.is_public(room_id) {
            return Err(AppError::NotFound("Room Not Found".into()));
        }

        let room = state.registry.get_room(room_id);
        room.lazy_initial_sync().await?;
        Ok(LoadedRoom(room))
    }
}

/// `!opaque:server.name`
pub fn is_valid_room_id(room_id: &str) -> bool {
    room_id
        .strip_prefix('!')
        .and_then(|rest| rest.split_once(':'))
        .is_some_and(|(local, server)| !local.is_empty() && !server.is_empty())
}
