use crate::entities::connections::ConnectionHandle;

/// One authenticated websocket session: the user it belongs to and the
/// connection that carries it.
#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: i64,
    pub connection: ConnectionHandle,
}
