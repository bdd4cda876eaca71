pub mod join_conversation;
pub mod mark_read;
pub mod send_message;
pub mod typing;

use crate::api::RequestContext;
use crate::common::error::ServiceResult;
use crate::models::events::{ClientEvent, ServerEvent};
use crate::models::sessions::Session;
use tracing::warn;

/// A handler's optional direct reply, pushed back to the originating
/// connection.
pub type EventResult = ServiceResult<Option<ServerEvent>>;

pub async fn handle_event(
    ctx: &RequestContext,
    session: &Session,
    event: ClientEvent,
) -> EventResult {
    match event {
        ClientEvent::Connect { .. } => {
            warn!(
                user_id = session.user_id,
                "connect received on an established session"
            );
            Ok(None)
        }
        ClientEvent::JoinConversation { other_user_id } => {
            join_conversation::handle(ctx, session, other_user_id).await
        }
        ClientEvent::SendMessage {
            receiver_id,
            content,
        } => send_message::handle(ctx, session, receiver_id, &content).await,
        ClientEvent::MarkRead { message_ids } => {
            mark_read::handle(ctx, session, message_ids).await
        }
        ClientEvent::Typing {
            receiver_id,
            is_typing,
        } => typing::handle(ctx, session, receiver_id, is_typing).await,
    }
}
