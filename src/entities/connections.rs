use crate::models::events::ServerEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Sender half of a connected client's outbound event channel.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Handle to one live client connection.
///
/// The id distinguishes a connection from its successor after a reconnect,
/// which is what makes stale unregisters detectable.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    connection_id: Uuid,
    sender: EventSender,
}

impl ConnectionHandle {
    pub fn new(sender: EventSender) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            sender,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Push an event to the client. Returns false if the connection is
    /// already closed.
    pub fn push(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}
