//! HTTP API endpoint handlers.
//!
//! The room page itself is rendered by the front-end; `room_page` only hands
//! out the parameters the page needs (room id plus the peer media-transport
//! coordinates).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
};

use chanoma_shared::time::timestamp_to_rfc3339;

use crate::{
    domain::RoomIdFactory,
    infrastructure::dto::http::{
        ParticipantDetailDto, RoomDetailDto, RoomPageDto, RoomSummaryDto,
    },
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Entry point: redirect to a freshly generated room
pub async fn room_entry() -> Redirect {
    let room_id = RoomIdFactory::generate().expect("generated room id is valid");
    Redirect::temporary(&format!("/rooms/{}", room_id))
}

/// Parameters for entering a room
///
/// Rooms are created lazily on the first join, so this succeeds for any
/// well-formed room id.
pub async fn room_page(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Json<RoomPageDto> {
    Json(RoomPageDto {
        room_id,
        peer_host: state.peer_config.host.clone(),
        peer_port: state.peer_config.port,
        peer_secure: state.peer_config.secure,
    })
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let room_summaries: Vec<RoomSummaryDto> = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            id: room.id.as_str().to_string(),
            participants: room
                .participants
                .iter()
                .map(|p| p.id.as_str().to_string())
                .collect(),
            connection_count: room.connection_count,
            message_count: room.message_count,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        })
        .collect();

    Json(room_summaries)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_room_detail_usecase.execute(room_id).await {
        Ok(room) => {
            // Domain Model から DTO への変換
            let room_detail = RoomDetailDto {
                id: room.id.as_str().to_string(),
                participants: room
                    .participants
                    .iter()
                    .map(|p| ParticipantDetailDto {
                        id: p.id.as_str().to_string(),
                        name: p.name.as_str().to_string(),
                    })
                    .collect(),
                connection_count: room.connection_count,
                message_count: room.message_count,
                created_at: timestamp_to_rfc3339(room.created_at.value()),
            };
            Ok(Json(room_detail))
        }
        Err(crate::usecase::GetRoomDetailError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
    }
}
