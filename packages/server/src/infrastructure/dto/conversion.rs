//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    ChatMessage, MessageText, RoomId, Timestamp, UserId, UserProfile, ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;
use swaphere_shared::time::now_utc_millis;

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<dto::ChatMessageDto> for ChatMessage {
    type Error = ValueObjectError;

    fn try_from(dto: dto::ChatMessageDto) -> Result<Self, Self::Error> {
        let timestamp = match &dto.timestamp {
            Some(value) => Timestamp::parse_rfc3339(value)?,
            None => Timestamp::new(now_utc_millis()),
        };
        Ok(Self {
            sender_id: UserId::new(dto.sender_id)?,
            sender_name: dto.sender_name,
            text: MessageText::new(dto.text)?,
            timestamp,
            room_id: RoomId::parse(&dto.room_id)?,
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<ChatMessage> for dto::ChatMessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            sender_id: model.sender_id.into_string(),
            sender_name: model.sender_name,
            text: model.text.into_string(),
            timestamp: Some(model.timestamp.to_rfc3339()),
            room_id: model.room_id.to_string(),
        }
    }
}

impl From<UserProfile> for dto::UserRef {
    fn from(model: UserProfile) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name,
            email: model.email,
            avatar: model.avatar,
            profession: model.profession,
        }
    }
}

impl TryFrom<dto::UserRef> for UserProfile {
    type Error = ValueObjectError;

    fn try_from(dto: dto::UserRef) -> Result<Self, Self::Error> {
        let id = UserId::new(dto.id)?;
        let name = if dto.name.trim().is_empty() {
            id.as_str().to_string()
        } else {
            dto.name
        };
        Ok(Self {
            id,
            name,
            email: dto.email,
            avatar: dto.avatar,
            profession: dto.profession,
        })
    }
}
