use crate::common::context::Context;
use crate::entities::connections::ConnectionHandle;
use crate::entities::messages::{Message, MessageStatus};
use crate::models::events::ServerEvent;
use crate::repositories::messages::MessageStore;
use crate::repositories::presences::PresenceRegistry;
use crate::repositories::queues::OfflineQueues;
use crate::repositories::rooms::RoomManager;
use crate::repositories::users::UserDirectory;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::mpsc;

/// In-memory [`MessageStore`] mirroring the SQL store's transition guards.
#[derive(Default)]
pub struct MemoryMessageStore {
    rows: Mutex<Vec<Message>>,
    next_id: AtomicI64,
    fail_writes: AtomicBool,
    fail_status_updates: AtomicBool,
}

impl MemoryMessageStore {
    /// Make every write fail, to exercise the persistence error path.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make only status transitions fail, so inserts still succeed.
    pub fn fail_status_updates(&self, fail: bool) {
        self.fail_status_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fetch(&self, message_id: i64) -> Option<Message> {
        let rows = self.rows.lock().unwrap();
        rows.iter().find(|m| m.id == message_id).cloned()
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("store is down");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> anyhow::Result<Message> {
        self.check_writable()?;
        let message = Message {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            sender_id,
            receiver_id,
            content: content.to_owned(),
            status: MessageStatus::Sent,
            created_at: Utc::now(),
            delivered_at: None,
            read_at: None,
        };
        self.rows.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn update_status(
        &self,
        message_id: i64,
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.update_status_batch(&[message_id], status, at).await
    }

    async fn update_status_batch(
        &self,
        message_ids: &[i64],
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.check_writable()?;
        if self.fail_status_updates.load(Ordering::SeqCst) {
            anyhow::bail!("store is down");
        }
        let mut rows = self.rows.lock().unwrap();
        for row in rows
            .iter_mut()
            .filter(|m| message_ids.contains(&m.id) && m.status.can_become(status))
        {
            row.status = status;
            match status {
                MessageStatus::Delivered => row.delivered_at = Some(at),
                MessageStatus::Read => row.read_at = Some(at),
                _ => (),
            }
        }
        Ok(())
    }

    async fn fetch_many(&self, message_ids: &[i64]) -> anyhow::Result<Vec<Message>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|m| message_ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn fetch_by_participants(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> anyhow::Result<Vec<Message>> {
        let rows = self.rows.lock().unwrap();
        let mut messages: Vec<Message> = rows
            .iter()
            .filter(|m| {
                (m.sender_id == user_a && m.receiver_id == user_b)
                    || (m.sender_id == user_b && m.receiver_id == user_a)
            })
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }
}

/// Directory with a fixed set of known user ids.
pub struct StaticUserDirectory {
    known: Vec<i64>,
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn exists(&self, user_id: i64) -> anyhow::Result<bool> {
        Ok(self.known.contains(&user_id))
    }
}

pub struct TestContext {
    pub messages: MemoryMessageStore,
    pub users: StaticUserDirectory,
    pub presences: PresenceRegistry,
    pub queues: OfflineQueues,
    pub rooms: RoomManager,
}

impl TestContext {
    pub fn new(known_users: &[i64]) -> Self {
        Self {
            messages: MemoryMessageStore::default(),
            users: StaticUserDirectory {
                known: known_users.to_vec(),
            },
            presences: PresenceRegistry::new(),
            queues: OfflineQueues::new(),
            rooms: RoomManager::new(),
        }
    }
}

impl Context for TestContext {
    fn messages(&self) -> &dyn MessageStore {
        &self.messages
    }

    fn users(&self) -> &dyn UserDirectory {
        &self.users
    }

    fn presences(&self) -> &PresenceRegistry {
        &self.presences
    }

    fn queues(&self) -> &OfflineQueues {
        &self.queues
    }

    fn rooms(&self) -> &RoomManager {
        &self.rooms
    }
}

pub fn connection() -> (ConnectionHandle, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ConnectionHandle::new(tx), rx)
}
