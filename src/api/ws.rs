use crate::api::RequestContext;
use crate::common::error::AppError;
use crate::common::state::AppState;
use crate::entities::connections::ConnectionHandle;
use crate::events;
use crate::models::events::{ClientEvent, ServerEvent};
use crate::models::sessions::Session;
use crate::usecases::presences;
use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(sink, rx));

    let connection = ConnectionHandle::new(tx);
    let ctx = RequestContext::from_state(&state);

    // The first frame must establish the session.
    let Some(session) = establish_session(&ctx, &connection, &mut stream).await else {
        // Dropping the last sender ends the writer once pending frames
        // (e.g. the error reply) are flushed.
        drop(connection);
        let _ = writer.await;
        return;
    };
    connection.push(ServerEvent::Connected {
        user_id: session.user_id,
    });

    while let Some(Ok(frame)) = stream.next().await {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };
        let event = match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                debug!(user_id = session.user_id, "undecodable frame: {e}");
                push_error(&connection, &AppError::DecodingRequestFailed);
                continue;
            }
        };
        match events::handle_event(&ctx, &session, event).await {
            Ok(None) => (),
            Ok(Some(reply)) => {
                session.connection.push(reply);
            }
            Err(e) => push_error(&connection, &e),
        }
    }

    presences::disconnect(&ctx, &session);
    drop(session);
    drop(connection);
    let _ = writer.await;
}

async fn write_events(
    mut sink: SplitSink<WebSocket, WsMessage>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(_) => continue,
        };
        if sink.send(WsMessage::Text(payload.into())).await.is_err() {
            break;
        }
    }
}

async fn establish_session(
    ctx: &RequestContext,
    connection: &ConnectionHandle,
    stream: &mut SplitStream<WebSocket>,
) -> Option<Session> {
    let frame = loop {
        match stream.next().await? {
            Ok(WsMessage::Text(text)) => break text,
            Ok(WsMessage::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    };
    let user_id = match serde_json::from_str::<ClientEvent>(frame.as_str()) {
        Ok(ClientEvent::Connect { user_id }) => user_id,
        Ok(_) | Err(_) => {
            push_error(connection, &AppError::DecodingRequestFailed);
            return None;
        }
    };
    match presences::connect(ctx, user_id, connection.clone()).await {
        Ok(session) => Some(session),
        Err(e) => {
            push_error(connection, &e);
            None
        }
    }
}

fn push_error(connection: &ConnectionHandle, error: &AppError) {
    connection.push(ServerEvent::Error {
        code: error.code(),
        message: error.message(),
    });
}
