use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::connections::ConnectionHandle;
use crate::models::events::ServerEvent;
use crate::models::sessions::Session;
use crate::usecases::messages;
use tracing::{info, warn};

/// Establish a session: validate the user, register the connection
/// (replacing any prior one), announce presence, then flush the user's
/// offline backlog through the normal delivery path.
pub async fn connect<C: Context + ?Sized>(
    ctx: &C,
    user_id: i64,
    connection: ConnectionHandle,
) -> ServiceResult<Session> {
    match ctx.users().exists(user_id).await {
        Ok(true) => (),
        Ok(false) => return Err(AppError::UsersNotFound),
        Err(e) => return unexpected(e),
    }

    let replaced = ctx.presences().register(user_id, connection.clone());
    if let Some(old) = replaced {
        ctx.rooms().leave_all(old.connection_id());
    }
    info!(user_id, "client connected");
    broadcast_presence(ctx, user_id, true);

    // A failed flush is not fatal to the session: the user is already
    // registered and announced, and whatever the flush could not deliver
    // stays queued for the next attempt.
    if let Err(e) = messages::flush_queue(ctx, user_id).await {
        warn!(user_id, code = e.code(), "flushing offline queue failed");
    }
    Ok(Session {
        user_id,
        connection,
    })
}

/// Tear down a session. The unregister is guarded by connection id, so a
/// stale disconnect arriving after a reconnect leaves the newer entry (and
/// emits nothing).
pub fn disconnect<C: Context + ?Sized>(ctx: &C, session: &Session) {
    ctx.rooms().leave_all(session.connection.connection_id());
    if ctx
        .presences()
        .unregister(session.user_id, session.connection.connection_id())
    {
        info!(user_id = session.user_id, "client disconnected");
        broadcast_presence(ctx, session.user_id, false);
    }
}

pub fn is_online<C: Context + ?Sized>(ctx: &C, user_id: i64) -> bool {
    ctx.presences().is_online(user_id)
}

fn broadcast_presence<C: Context + ?Sized>(ctx: &C, user_id: i64, online: bool) {
    let event = ServerEvent::PresenceChanged { user_id, online };
    for connection in ctx.presences().snapshot() {
        connection.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::{TestContext, connection};
    use crate::entities::messages::MessageStatus;

    const ALICE: i64 = 1;
    const BOB: i64 = 2;

    #[tokio::test]
    async fn connect_flushes_the_offline_backlog() {
        let ctx = TestContext::new(&[ALICE, BOB]);
        let queued = messages::send(&ctx, ALICE, BOB, "hi").await.unwrap();
        assert_eq!(queued.status, MessageStatus::Queued);

        let (conn, mut rx) = connection();
        connect(&ctx, BOB, conn).await.unwrap();

        // connected frame is pushed by the transport layer; here the first
        // events are the presence change and the flushed message.
        let mut got_message = false;
        while let Ok(event) = rx.try_recv() {
            if let ServerEvent::MessageReceived { message } = event {
                assert_eq!(message.id, queued.id);
                assert_eq!(message.status, MessageStatus::Delivered);
                got_message = true;
            }
        }
        assert!(got_message);
        assert_eq!(ctx.queues.len(BOB).await, 0);
    }

    #[tokio::test]
    async fn connect_keeps_the_session_when_the_flush_fails() {
        let ctx = TestContext::new(&[ALICE, BOB]);
        messages::send(&ctx, ALICE, BOB, "hi").await.unwrap();
        ctx.messages.fail_status_updates(true);

        let (conn, _rx) = connection();
        let session = connect(&ctx, BOB, conn).await.unwrap();
        assert!(ctx.presences.is_online(BOB));

        // Teardown still goes through the normal path.
        disconnect(&ctx, &session);
        assert!(!ctx.presences.is_online(BOB));
    }

    #[tokio::test]
    async fn connect_rejects_unknown_users() {
        let ctx = TestContext::new(&[ALICE]);
        let (conn, _rx) = connection();
        let err = connect(&ctx, 99, conn).await.unwrap_err();
        assert_eq!(err, AppError::UsersNotFound);
        assert!(!ctx.presences.is_online(99));
    }

    #[tokio::test]
    async fn presence_changes_fan_out_to_online_users() {
        let ctx = TestContext::new(&[ALICE, BOB]);
        let (alice_conn, mut alice_rx) = connection();
        connect(&ctx, ALICE, alice_conn).await.unwrap();
        while alice_rx.try_recv().is_ok() {}

        let (bob_conn, _bob_rx) = connection();
        let session = connect(&ctx, BOB, bob_conn).await.unwrap();
        match alice_rx.try_recv().unwrap() {
            ServerEvent::PresenceChanged { user_id, online } => {
                assert_eq!(user_id, BOB);
                assert!(online);
            }
            other => panic!("expected presence_changed, got {other:?}"),
        }

        disconnect(&ctx, &session);
        match alice_rx.try_recv().unwrap() {
            ServerEvent::PresenceChanged { user_id, online } => {
                assert_eq!(user_id, BOB);
                assert!(!online);
            }
            other => panic!("expected presence_changed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_disconnect_does_not_evict_a_reconnect() {
        let ctx = TestContext::new(&[ALICE, BOB]);
        let (old_conn, _old_rx) = connection();
        let old_session = connect(&ctx, BOB, old_conn).await.unwrap();

        let (new_conn, _new_rx) = connection();
        connect(&ctx, BOB, new_conn.clone()).await.unwrap();

        // The old socket's teardown arrives late.
        disconnect(&ctx, &old_session);
        assert!(ctx.presences.is_online(BOB));
        assert_eq!(
            ctx.presences.lookup(BOB).unwrap().connection_id(),
            new_conn.connection_id()
        );
    }

    #[tokio::test]
    async fn queued_then_connect_then_read_completes_the_lifecycle() {
        // Full scenario: B sends to offline A, A connects, reads, B's open
        // conversation sees the receipt.
        let ctx = TestContext::new(&[ALICE, BOB]);
        let queued = messages::send(&ctx, BOB, ALICE, "hi").await.unwrap();
        assert_eq!(queued.status, MessageStatus::Queued);

        let (alice_conn, mut alice_rx) = connection();
        connect(&ctx, ALICE, alice_conn).await.unwrap();

        let mut delivered_id = None;
        while let Ok(event) = alice_rx.try_recv() {
            if let ServerEvent::MessageReceived { message } = event {
                assert_eq!(message.status, MessageStatus::Delivered);
                delivered_id = Some(message.id);
            }
        }
        let delivered_id = delivered_id.expect("flush should deliver the queued message");

        let (bob_conn, mut bob_rx) = connection();
        ctx.rooms
            .join(crate::entities::rooms::RoomKey::for_pair(ALICE, BOB), bob_conn);

        messages::mark_read(&ctx, ALICE, &[delivered_id]).await.unwrap();
        match bob_rx.try_recv().unwrap() {
            ServerEvent::MessagesRead { message_ids } => {
                assert_eq!(message_ids, vec![delivered_id]);
            }
            other => panic!("expected messages_read, got {other:?}"),
        }
        assert_eq!(
            ctx.messages.fetch(delivered_id).unwrap().status,
            MessageStatus::Read
        );
    }
}
