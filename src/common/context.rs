use crate::repositories::messages::MessageStore;
use crate::repositories::presences::PresenceRegistry;
use crate::repositories::queues::OfflineQueues;
use crate::repositories::rooms::RoomManager;
use crate::repositories::users::UserDirectory;

/// Access to the collaborators a usecase needs. The store and directory
/// are external systems behind trait objects; the registries are the
/// subsystem's own in-process state.
pub trait Context: Send + Sync {
    fn messages(&self) -> &dyn MessageStore;
    fn users(&self) -> &dyn UserDirectory;
    fn presences(&self) -> &PresenceRegistry;
    fn queues(&self) -> &OfflineQueues;
    fn rooms(&self) -> &RoomManager;
}
