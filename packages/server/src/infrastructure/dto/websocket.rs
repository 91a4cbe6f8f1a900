//! WebSocket wire-protocol DTOs.
//!
//! Every frame is a JSON object carrying a `type` discriminator. The event
//! names are server-authoritative:
//!
//! | Direction | type |
//! |---|---|
//! | client → server | `join-room`, `chat-message` |
//! | server → joiner | `room-users`, `chat-history` |
//! | server → others | `user-connected`, `user-disconnected`, `chat-message` |

use serde::{Deserialize, Serialize};

/// Wire-protocol event discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "join-room")]
    JoinRoom,
    #[serde(rename = "room-users")]
    RoomUsers,
    #[serde(rename = "chat-history")]
    ChatHistory,
    #[serde(rename = "user-connected")]
    UserConnected,
    #[serde(rename = "user-disconnected")]
    UserDisconnected,
    #[serde(rename = "chat-message")]
    ChatMessage,
}

/// client → server: join a room
///
/// Must be the first frame a client sends after the WebSocket upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomMessage {
    pub r#type: MessageType,
    pub room_id: String,
    pub participant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// One entry of the deduplicated participant view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomUserDto {
    pub id: String,
    pub name: String,
}

/// server → joiner: deduplicated participant view plus the joiner's own
/// resolved display name. Sent exactly once per join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomUsersMessage {
    pub r#type: MessageType,
    pub users: Vec<RoomUserDto>,
    pub own_name: String,
}

/// One chat message on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub sender: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: i64,
}

/// server → joiner: full chat history, oldest first. Sent exactly once per
/// join; the receiving side replaces any prior local view with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryMessage {
    pub r#type: MessageType,
    pub messages: Vec<ChatMessageDto>,
}

/// server → others: a participant became present in the room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConnectedMessage {
    pub r#type: MessageType,
    pub participant_id: String,
    pub display_name: String,
}

/// server → others: a participant fully left the room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDisconnectedMessage {
    pub r#type: MessageType,
    pub participant_id: String,
}

/// client → server: post a chat message (text only; the server resolves the
/// sender and stamps the timestamp)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSendMessage {
    pub r#type: MessageType,
    pub text: String,
}

/// server → others: chat fan-out, excluding the original sender connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBroadcastMessage {
    pub r#type: MessageType,
    pub sender: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: i64,
}
