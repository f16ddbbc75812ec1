//! Room query handler.

use crate::errors::HubError;
use crate::hub::RoomInfo;
use crate::routes::AppState;
use crate::types::RoomId;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// `GET /rooms/:room_id`
///
/// ## Example Response
///
/// ```json
/// {
///   "roomId": "standup",
///   "participantCount": 1,
///   "participants": [{"participantId": "p1", "participantName": "Ada"}]
/// }
/// ```
///
/// 404 with `ROOM_NOT_FOUND` if no session is in the room.
#[instrument(skip_all, name = "hub.rooms.get")]
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomInfo>, HubError> {
    let info = state.hub.room_info(RoomId::new(room_id)).await?;
    Ok(Json(info))
}
