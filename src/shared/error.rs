//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::services::{RoomError, TimelineError};
use crate::domain::GatewayError;

/// User-facing message for a room whose initial sync failed
pub const ROOM_LOAD_FAILED: &str = "Failed to load room.";

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The room exists but cannot be served right now
    #[error("Room unavailable: {0}")]
    RoomUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl From<TimelineError> for AppError {
    fn from(err: TimelineError) -> Self {
        match err {
            TimelineError::CouldNotFindEvent { anchor } => {
                tracing::debug!(anchor = %anchor, "Anchor could not be located");
                AppError::RoomUnavailable("Given up while looking for given event.".into())
            }
            TimelineError::NoCachedEvents => {
                AppError::RoomUnavailable("Unknown error encountered.".into())
            }
            TimelineError::Unknown(e) => {
                tracing::warn!("Timeline fetch failed: {}", e);
                AppError::RoomUnavailable("Unknown error encountered.".into())
            }
        }
    }
}

impl From<RoomError> for AppError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotLoaded => AppError::RoomUnavailable(ROOM_LOAD_FAILED.into()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        tracing::warn!("Room failed to load: {}", err);
        AppError::RoomUnavailable(ROOM_LOAD_FAILED.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, 10001, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, 10002, msg.clone()),
            AppError::RoomUnavailable(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, 10003, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        let body = ErrorResponse { code, message };

        (status, Json(body)).into_response()
    }
}
