//! Chat message entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::MessageId;

/// A message posted to a room. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    /// Author display name
    pub username: String,
    /// Message body
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub room: String,
}

impl ChatMessage {
    /// Create a new message stamped with the current time
    pub fn new(
        id: MessageId,
        username: impl Into<String>,
        room: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            message: body.into(),
            timestamp: Utc::now(),
            room: room.into(),
        }
    }

    /// Arrival time used as the room index score
    #[inline]
    pub fn arrival_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Get a truncated preview of the body (for logs)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.message.len() <= max_len {
            &self.message
        } else {
            let mut end = max_len;
            while !self.message.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.message[..end]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = ChatMessage::new(MessageId::new(7), "alice", "general", "hi");
        assert_eq!(msg.id, MessageId::new(7));
        assert_eq!(msg.username, "alice");
        assert_eq!(msg.room, "general");
        assert_eq!(msg.message, "hi");
        assert_eq!(msg.arrival_millis(), msg.timestamp.timestamp_millis());
    }

    #[test]
    fn test_message_wire_shape() {
        let msg = ChatMessage::new(MessageId::new(99), "bob", "lobby", "hello");
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["id"], "99");
        assert_eq!(value["username"], "bob");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["room"], "lobby");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let msg = ChatMessage::new(MessageId::new(1), "a", "r", "héllo wörld");
        assert_eq!(msg.preview(100), "héllo wörld");
        // 'é' is two bytes; cutting at 2 must back off to 1
        assert_eq!(msg.preview(2), "h");
    }
}
