use crate::entities::messages::{Message as MessageEntity, MessageStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Wire view of a message, as clients see it.
#[derive(Clone, Debug, Serialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<MessageEntity> for Message {
    fn from(value: MessageEntity) -> Self {
        Self {
            id: value.id,
            sender_id: value.sender_id,
            receiver_id: value.receiver_id,
            content: value.content,
            status: value.status,
            created_at: value.created_at,
            delivered_at: value.delivered_at,
            read_at: value.read_at,
        }
    }
}

impl Message {
    /// View of a message at the moment it is pushed to a live connection.
    pub fn delivered(entity: &MessageEntity, delivered_at: DateTime<Utc>) -> Self {
        let mut message = Self::from(entity.clone());
        message.status = MessageStatus::Delivered;
        message.delivered_at = Some(delivered_at);
        message
    }

    /// View of a message parked in the receiver's offline queue. The stored
    /// record stays `sent`; only the caller-visible status says `queued`.
    pub fn queued(entity: &MessageEntity) -> Self {
        let mut message = Self::from(entity.clone());
        message.status = MessageStatus::Queued;
        message
    }
}
