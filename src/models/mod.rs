pub mod events;
pub mod messages;
pub mod sessions;
