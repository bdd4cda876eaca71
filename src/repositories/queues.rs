use crate::entities::messages::Message;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-receiver FIFO buffers for messages that could not be delivered live.
///
/// The mutex around each buffer doubles as the receiver's serialization
/// point: `send` and the reconnect flush both take it, so the two paths can
/// never interleave for one receiver while different receivers proceed in
/// parallel.
#[derive(Default)]
pub struct OfflineQueues {
    queues: DashMap<i64, Arc<Mutex<VecDeque<Message>>>>,
}

impl OfflineQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue (and lock) for one receiver, created on first use.
    pub fn for_receiver(&self, user_id: i64) -> Arc<Mutex<VecDeque<Message>>> {
        self.queues.entry(user_id).or_default().value().clone()
    }

    pub async fn len(&self, user_id: i64) -> usize {
        // Clone the Arc out so no shard lock is held across the await.
        let queue = match self.queues.get(&user_id) {
            Some(queue) => queue.value().clone(),
            None => return 0,
        };
        let queue = queue.lock().await;
        queue.len()
    }
}
