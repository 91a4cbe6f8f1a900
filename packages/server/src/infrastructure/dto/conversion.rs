//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    entity,
    value_object::{DisplayName, MessageText, ParticipantId, Timestamp},
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<entity::ChatMessage> for dto::ChatMessageDto {
    fn from(model: entity::ChatMessage) -> Self {
        Self {
            sender: model.sender.into_string(),
            sender_name: model.sender_name.into_string(),
            text: model.text.into_string(),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<entity::Participant> for dto::RoomUserDto {
    fn from(model: entity::Participant) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name.into_string(),
        }
    }
}

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::ChatMessageDto> for entity::ChatMessage {
    fn from(dto: dto::ChatMessageDto) -> Self {
        Self {
            sender: ParticipantId::new(dto.sender).expect("sender should be valid in DTO"),
            sender_name: DisplayName::new(dto.sender_name)
                .expect("sender_name should be valid in DTO"),
            text: MessageText::new(dto.text).expect("text should be valid in DTO"),
            timestamp: Timestamp::new(dto.timestamp),
        }
    }
}
