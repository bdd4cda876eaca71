use crate::repositories::messages::MessageStore;
use crate::repositories::presences::PresenceRegistry;
use crate::repositories::queues::OfflineQueues;
use crate::repositories::rooms::RoomManager;
use crate::repositories::users::UserDirectory;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<dyn MessageStore>,
    pub users: Arc<dyn UserDirectory>,
    pub presences: Arc<PresenceRegistry>,
    pub queues: Arc<OfflineQueues>,
    pub rooms: Arc<RoomManager>,
}
