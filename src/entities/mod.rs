pub mod connections;
pub mod messages;
pub mod rooms;
