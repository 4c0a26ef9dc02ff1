//! Redis key layout
//!
//! - `user:{connId}`: participant hash (id, username, room, joinedAt)
//! - `room:{room}:users`: set of connection ids joined to the room
//! - `message:{id}`: message hash (id, username, message, timestamp, room)
//! - `room:{room}:messages`: sorted set of message ids scored by arrival ms

pub const USER_KEY_PREFIX: &str = "user:";
pub const MESSAGE_KEY_PREFIX: &str = "message:";

#[must_use]
pub fn user_key(connection_id: &str) -> String {
    format!("{USER_KEY_PREFIX}{connection_id}")
}

#[must_use]
pub fn room_users_key(room: &str) -> String {
    format!("room:{room}:users")
}

#[must_use]
pub fn message_key(id: impl std::fmt::Display) -> String {
    format!("{MESSAGE_KEY_PREFIX}{id}")
}

#[must_use]
pub fn room_messages_key(room: &str) -> String {
    format!("room:{room}:messages")
}
