use crate::entities::connections::ConnectionHandle;
use dashmap::DashMap;
use uuid::Uuid;

/// The single source of truth for "is user X currently reachable".
///
/// One entry per user id; a new registration for the same user replaces the
/// old one (reconnect semantics, not multi-device). All operations are
/// atomic per key via the shard locks, so a lookup never observes a
/// half-updated entry.
#[derive(Default)]
pub struct PresenceRegistry {
    entries: DashMap<i64, ConnectionHandle>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `user_id` is reachable via `connection`. Returns the
    /// replaced handle when this was a reconnect.
    pub fn register(&self, user_id: i64, connection: ConnectionHandle) -> Option<ConnectionHandle> {
        self.entries.insert(user_id, connection)
    }

    /// Remove the entry for `user_id`, but only if it still points at
    /// `connection_id`. A stale unregister racing a newer registration
    /// leaves the newer entry alone. Returns whether removal occurred.
    pub fn unregister(&self, user_id: i64, connection_id: Uuid) -> bool {
        self.entries
            .remove_if(&user_id, |_, entry| entry.connection_id() == connection_id)
            .is_some()
    }

    pub fn lookup(&self, user_id: i64) -> Option<ConnectionHandle> {
        self.entries.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn is_online(&self, user_id: i64) -> bool {
        self.entries.contains_key(&user_id)
    }

    pub fn online_count(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of every live connection, for presence fan-out.
    pub fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
