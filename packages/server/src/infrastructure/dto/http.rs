//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Room summary for the rooms list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    /// Deduplicated participant ids
    pub participants: Vec<String>,
    pub connection_count: usize,
    pub message_count: usize,
    pub created_at: String,
}

/// One participant in the room detail response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDetailDto {
    pub id: String,
    pub name: String,
}

/// Room detail response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub participants: Vec<ParticipantDetailDto>,
    pub connection_count: usize,
    pub message_count: usize,
    pub created_at: String,
}

/// Parameters a browser needs to enter a room: the room identifier plus the
/// peer media-transport coordinates. Page rendering itself happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPageDto {
    pub room_id: String,
    pub peer_host: String,
    pub peer_port: u16,
    pub peer_secure: bool,
}
