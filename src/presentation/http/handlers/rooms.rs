//! Public Directory Handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::application::dto::{PageQuery, PublicRoomsResponse};
use crate::shared::pagination::PageWindow;
use crate::startup::AppState;

/// GET /?page=N
///
/// One page of the cached public room directory. The directory is loaded
/// inline only if no snapshot has ever been taken.
pub async fn public_rooms(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<PublicRoomsResponse> {
    if state.registry.public_rooms().refreshed_at.is_none() {
        if let Err(err) = state.registry.load_public_rooms(false).await {
            tracing::warn!(error = %err, "Serving empty public room directory");
        }
    }

    let window = PageWindow::new(query.page(), state.settings.pagination.public_rooms_page_size);
    let total = state.registry.public_rooms().entries.len();

    Json(PublicRoomsResponse {
        rooms: state.registry.public_room_page(window.skip, window.end_bound()),
        page: window.page,
        total,
    })
}
