use crate::models::messages::Message;
use serde::{Deserialize, Serialize};

/// Inbound client frames. `connect` must be the first frame on a socket;
/// everything else requires an established session.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Connect { user_id: i64 },
    JoinConversation { other_user_id: i64 },
    SendMessage { receiver_id: i64, content: String },
    MarkRead { message_ids: Vec<i64> },
    Typing { receiver_id: i64, is_typing: bool },
}

/// Outbound server frames.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        user_id: i64,
    },
    PresenceChanged {
        user_id: i64,
        online: bool,
    },
    MessageReceived {
        message: Message,
    },
    /// Synchronous answer to `send_message`; the embedded status is either
    /// `delivered` or `queued`.
    SendResult {
        message: Message,
    },
    MessagesRead {
        message_ids: Vec<i64>,
    },
    Typing {
        user_id: i64,
        is_typing: bool,
    },
    Error {
        code: &'static str,
        message: &'static str,
    },
}
