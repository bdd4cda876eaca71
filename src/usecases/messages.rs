use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::messages::{Message as MessageEntity, MessageStatus};
use crate::entities::rooms::RoomKey;
use crate::models::events::ServerEvent;
use crate::models::messages::Message;
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use std::collections::VecDeque;
use tracing::{debug, error};

const MAX_CONTENT_LENGTH: usize = 2000;

/// Send a direct message.
///
/// The receiver's queue mutex is held across persistence and delivery so
/// that concurrent sends to the same receiver, and a racing reconnect
/// flush, serialize into one total order. Any queued backlog is drained
/// before the new message goes out, keeping conversation order equal to
/// send order across a reconnect.
pub async fn send<C: Context + ?Sized>(
    ctx: &C,
    sender_id: i64,
    receiver_id: i64,
    content: &str,
) -> ServiceResult<Message> {
    if content.is_empty() || content.len() > MAX_CONTENT_LENGTH {
        return Err(AppError::MessagesInvalidLength);
    }
    validate_participant(ctx, sender_id).await?;
    validate_participant(ctx, receiver_id).await?;

    let queue = ctx.queues().for_receiver(receiver_id);
    let mut queue = queue.lock().await;

    let message = match ctx.messages().insert(sender_id, receiver_id, content).await {
        Ok(message) => message,
        Err(e) => {
            error!(sender_id, receiver_id, "failed to persist message: {e}");
            return Err(AppError::MessagesPersistenceFailed);
        }
    };

    // If the backlog could not be fully drained (store trouble mid-drain,
    // or the receiver vanished again), the new message lines up behind it:
    // attempting a live push here could overtake the queued backlog, and
    // surfacing the drain error would strand an already-persisted message
    // in no queue at all. The next flush delivers everything in send order.
    let backlog_drained = drain_locked(ctx, &mut queue).await.is_ok();
    if !backlog_drained || !queue.is_empty() {
        let queued = Message::queued(&message);
        queue.push_back(message);
        return Ok(queued);
    }

    let delivered_at = Utc::now();
    if try_push_live(ctx, &message, delivered_at) {
        persist_delivery(ctx, message.id, delivered_at).await?;
        Ok(Message::delivered(&message, delivered_at))
    } else {
        debug!(
            message_id = message.id,
            receiver_id, "receiver unreachable, queueing message"
        );
        let queued = Message::queued(&message);
        queue.push_back(message);
        Ok(queued)
    }
}

/// Drain a user's offline queue after reconnection, delivering in FIFO
/// order through the same live path as `send`. Returns how many messages
/// went out; anything undeliverable stays queued for the next flush.
pub async fn flush_queue<C: Context + ?Sized>(ctx: &C, user_id: i64) -> ServiceResult<usize> {
    let queue = ctx.queues().for_receiver(user_id);
    let mut queue = queue.lock().await;
    let before = queue.len();
    drain_locked(ctx, &mut queue).await?;
    let flushed = before - queue.len();
    if flushed > 0 {
        debug!(user_id, flushed, "flushed offline queue");
    }
    Ok(flushed)
}

/// Acknowledge messages as read. Only ids addressed to `reader_id` and
/// currently `delivered` transition; the rest are left untouched. Read
/// receipts fan out to the conversation room of each affected pair so the
/// original sender's client can reflect them.
pub async fn mark_read<C: Context + ?Sized>(
    ctx: &C,
    reader_id: i64,
    message_ids: &[i64],
) -> ServiceResult<Vec<i64>> {
    if message_ids.is_empty() {
        return Ok(vec![]);
    }
    let messages = match ctx.messages().fetch_many(message_ids).await {
        Ok(messages) => messages,
        Err(e) => {
            error!(reader_id, "failed to load messages for read-mark: {e}");
            return Err(AppError::MessagesPersistenceFailed);
        }
    };

    let readable: Vec<&MessageEntity> = messages
        .iter()
        .filter(|m| m.receiver_id == reader_id && m.status == MessageStatus::Delivered)
        .collect();
    if readable.is_empty() {
        return Ok(vec![]);
    }

    let read_at = Utc::now();
    let read_ids: Vec<i64> = readable.iter().map(|m| m.id).collect();
    if let Err(e) = ctx
        .messages()
        .update_status_batch(&read_ids, MessageStatus::Read, read_at)
        .await
    {
        error!(reader_id, "failed to mark messages read: {e}");
        return Err(AppError::MessagesPersistenceFailed);
    }

    let mut per_room: HashMap<RoomKey, Vec<i64>> = HashMap::new();
    for message in readable {
        let room = RoomKey::for_pair(message.sender_id, message.receiver_id);
        per_room.entry(room).or_default().push(message.id);
    }
    for (room, message_ids) in per_room {
        ctx.rooms()
            .broadcast(&room, &ServerEvent::MessagesRead { message_ids });
    }
    Ok(read_ids)
}

/// Message history between two users, oldest first.
pub async fn fetch_conversation<C: Context + ?Sized>(
    ctx: &C,
    user_a: i64,
    user_b: i64,
) -> ServiceResult<Vec<Message>> {
    match ctx.messages().fetch_by_participants(user_a, user_b).await {
        Ok(messages) => Ok(messages.into_iter().map(Message::from).collect()),
        Err(e) => {
            error!(user_a, user_b, "failed to load conversation: {e}");
            Err(AppError::MessagesPersistenceFailed)
        }
    }
}

async fn validate_participant<C: Context + ?Sized>(ctx: &C, user_id: i64) -> ServiceResult<()> {
    match ctx.users().exists(user_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::MessagesInvalidParticipant),
        Err(e) => unexpected(e),
    }
}

/// Push a message to the receiver's live connection and echo it to the
/// other connections joined to the conversation room. Returns false when
/// the receiver is absent, or when the registry said present but the
/// connection turned out to be closed (the delivery race the queue path
/// recovers from).
fn try_push_live<C: Context + ?Sized>(
    ctx: &C,
    message: &MessageEntity,
    delivered_at: DateTime<Utc>,
) -> bool {
    let Some(connection) = ctx.presences().lookup(message.receiver_id) else {
        return false;
    };
    let event = ServerEvent::MessageReceived {
        message: Message::delivered(message, delivered_at),
    };
    if !connection.push(event.clone()) {
        debug!(
            message_id = message.id,
            receiver_id = message.receiver_id,
            "presence hit but connection closed, falling back to queue"
        );
        return false;
    }
    let room = RoomKey::for_pair(message.sender_id, message.receiver_id);
    ctx.rooms()
        .broadcast_except(&room, connection.connection_id(), &event);
    true
}

async fn persist_delivery<C: Context + ?Sized>(
    ctx: &C,
    message_id: i64,
    delivered_at: DateTime<Utc>,
) -> ServiceResult<()> {
    match ctx
        .messages()
        .update_status(message_id, MessageStatus::Delivered, delivered_at)
        .await
    {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(message_id, "failed to record delivery: {e}");
            Err(AppError::MessagesPersistenceFailed)
        }
    }
}

/// FIFO drain of a locked queue through the live path. Per message: push,
/// pop, then record delivery. A failed push stops the drain with the
/// message still at the head, so nothing undelivered is lost; a message is
/// only popped after the client actually got it, so nothing is delivered
/// twice.
async fn drain_locked<C: Context + ?Sized>(
    ctx: &C,
    queue: &mut VecDeque<MessageEntity>,
) -> ServiceResult<()> {
    while let Some(message) = queue.front() {
        let delivered_at = Utc::now();
        if !try_push_live(ctx, message, delivered_at) {
            break;
        }
        let message_id = message.id;
        queue.pop_front();
        persist_delivery(ctx, message_id, delivered_at).await?;
    }
    Ok(())
}
