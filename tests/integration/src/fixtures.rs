//! Test fixtures and data generators
//!
//! Frame builders for the WebSocket protocol and response shapes for the HTTP
//! routes.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Room name unique across test runs sharing one Redis
pub fn unique_room() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("room-{}-{}", unique_suffix(), &id[..8])
}

/// A frame received from the server
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    /// Usernames listed in a `room-users` frame, in order
    pub fn usernames(&self) -> Vec<String> {
        self.data
            .as_array()
            .map(|users| {
                users
                    .iter()
                    .filter_map(|u| u["username"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn join_frame(username: &str, room: &str) -> Value {
    json!({"event": "join-room", "data": {"username": username, "room": room}})
}

pub fn message_frame(text: &str) -> Value {
    json!({"event": "send-message", "data": {"message": text}})
}

pub fn typing_frame(is_typing: bool) -> Value {
    let event = if is_typing { "typing-start" } else { "typing-stop" };
    json!({"event": event})
}

/// `GET /health`
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// `GET /api/rooms`
#[derive(Debug, Deserialize)]
pub struct RoomsResponse {
    pub rooms: Vec<String>,
}

/// `GET /api/redis/status`
#[derive(Debug, Deserialize)]
pub struct StoreStatusResponse {
    pub status: String,
    pub mode: String,
    pub pool: Option<Value>,
}

/// `GET /api/redis/room/:room/messages`
#[derive(Debug, Deserialize)]
pub struct RoomMessagesResponse {
    pub room: String,
    pub count: usize,
    pub messages: Vec<Value>,
}

/// `GET /api/redis/room/:room/users`
#[derive(Debug, Deserialize)]
pub struct RoomUsersResponse {
    pub room: String,
    pub count: usize,
    pub users: Vec<Value>,
}

/// Error body of any failed HTTP call
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
