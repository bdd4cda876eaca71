pub mod messages;
pub mod presences;
pub mod queues;
pub mod rooms;
pub mod users;
