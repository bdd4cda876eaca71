use crate::entities::connections::ConnectionHandle;
use crate::entities::rooms::RoomKey;
use crate::models::events::ServerEvent;
use dashmap::DashMap;
use hashbrown::HashMap;
use uuid::Uuid;

/// Fan-out table: room key -> connections subscribed to that conversation.
///
/// Rooms have no lifecycle of their own; they appear on first join and
/// vanish when the last connection leaves. Broadcasting to a room nobody
/// joined is a silent no-op.
#[derive(Default)]
pub struct RoomManager {
    rooms: DashMap<RoomKey, HashMap<Uuid, ConnectionHandle>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room: RoomKey, connection: ConnectionHandle) {
        self.rooms
            .entry(room)
            .or_default()
            .insert(connection.connection_id(), connection);
    }

    pub fn leave(&self, room: &RoomKey, connection_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&connection_id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }

    /// Drop a closing connection from every room it joined.
    pub fn leave_all(&self, connection_id: Uuid) {
        let mut emptied = vec![];
        for mut entry in self.rooms.iter_mut() {
            entry.value_mut().remove(&connection_id);
            if entry.value().is_empty() {
                emptied.push(entry.key().clone());
            }
        }
        for room in emptied {
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }
    }

    /// Deliver `event` to every connection in the room. Connections whose
    /// channel has closed are pruned on the way. Returns how many
    /// connections received the event.
    pub fn broadcast(&self, room: &RoomKey, event: &ServerEvent) -> usize {
        self.broadcast_inner(room, None, event)
    }

    /// Like [`broadcast`](Self::broadcast), skipping one connection (the
    /// one that already received the event directly).
    pub fn broadcast_except(
        &self,
        room: &RoomKey,
        excluded_connection_id: Uuid,
        event: &ServerEvent,
    ) -> usize {
        self.broadcast_inner(room, Some(excluded_connection_id), event)
    }

    fn broadcast_inner(
        &self,
        room: &RoomKey,
        excluded_connection_id: Option<Uuid>,
        event: &ServerEvent,
    ) -> usize {
        let Some(mut members) = self.rooms.get_mut(room) else {
            return 0;
        };
        let mut reached = 0;
        members.retain(|connection_id, connection| {
            if Some(*connection_id) == excluded_connection_id {
                return true;
            }
            let alive = connection.push(event.clone());
            if alive {
                reached += 1;
            }
            alive
        });
        reached
    }
}
