use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::rooms::RoomKey;
use crate::models::events::ServerEvent;
use crate::models::sessions::Session;

/// Subscribe a session's connection to the conversation with another user.
pub async fn join_conversation<C: Context + ?Sized>(
    ctx: &C,
    session: &Session,
    other_user_id: i64,
) -> ServiceResult<RoomKey> {
    match ctx.users().exists(other_user_id).await {
        Ok(true) => (),
        Ok(false) => return Err(AppError::UsersNotFound),
        Err(e) => return unexpected(e),
    }
    let room = RoomKey::for_pair(session.user_id, other_user_id);
    ctx.rooms().join(room.clone(), session.connection.clone());
    Ok(room)
}

/// Ephemeral typing indicator. Broadcast to the conversation room, never
/// persisted and never queued; an unreachable receiver is a no-op.
pub fn typing<C: Context + ?Sized>(
    ctx: &C,
    session: &Session,
    receiver_id: i64,
    is_typing: bool,
) {
    let room = RoomKey::for_pair(session.user_id, receiver_id);
    let event = ServerEvent::Typing {
        user_id: session.user_id,
        is_typing,
    };
    ctx.rooms()
        .broadcast_except(&room, session.connection.connection_id(), &event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::{TestContext, connection};

    const ALICE: i64 = 1;
    const BOB: i64 = 2;

    fn session_for(user_id: i64) -> (Session, tokio::sync::mpsc::UnboundedReceiver<ServerEvent>) {
        let (conn, rx) = connection();
        (
            Session {
                user_id,
                connection: conn,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn typing_reaches_the_other_side_only() {
        let ctx = TestContext::new(&[ALICE, BOB]);
        let (alice, mut alice_rx) = session_for(ALICE);
        let (bob, mut bob_rx) = session_for(BOB);
        join_conversation(&ctx, &alice, BOB).await.unwrap();
        join_conversation(&ctx, &bob, ALICE).await.unwrap();

        typing(&ctx, &alice, BOB, true);
        match bob_rx.try_recv().unwrap() {
            ServerEvent::Typing { user_id, is_typing } => {
                assert_eq!(user_id, ALICE);
                assert!(is_typing);
            }
            other => panic!("expected typing, got {other:?}"),
        }
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn typing_with_nobody_listening_is_a_noop() {
        let ctx = TestContext::new(&[ALICE, BOB]);
        let (alice, _rx) = session_for(ALICE);
        typing(&ctx, &alice, BOB, true);
    }

    #[tokio::test]
    async fn joining_a_conversation_with_an_unknown_user_fails() {
        let ctx = TestContext::new(&[ALICE]);
        let (alice, _rx) = session_for(ALICE);
        let err = join_conversation(&ctx, &alice, 99).await.unwrap_err();
        assert_eq!(err, AppError::UsersNotFound);
    }
}
