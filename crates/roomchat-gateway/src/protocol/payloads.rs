//! Event payloads
//!
//! Inbound payloads are trimmed and then validated with `validator` before the
//! router acts on them. Length bounds count characters, not bytes.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// `join-room` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct JoinRoomPayload {
    #[validate(length(min = 2, max = 20, message = "Username must be 2-20 characters"))]
    pub username: String,
    #[validate(length(min = 2, max = 30, message = "Room name must be 2-30 characters"))]
    pub room: String,
}

impl JoinRoomPayload {
    /// Trim both names and validate them
    pub fn into_validated(self) -> Result<Self, ValidationErrors> {
        let payload = Self {
            username: self.username.trim().to_string(),
            room: self.room.trim().to_string(),
        };
        payload.validate()?;
        Ok(payload)
    }
}

/// `send-message` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct SendMessagePayload {
    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,
}

impl SendMessagePayload {
    /// Trim the body and validate it
    pub fn into_validated(self) -> Result<Self, ValidationErrors> {
        let payload = Self {
            message: self.message.trim().to_string(),
        };
        payload.validate()?;
        Ok(payload)
    }
}

/// `room-joined` payload, sent privately to the joiner
#[derive(Debug, Clone, Serialize)]
pub struct RoomJoinedPayload {
    pub room: String,
    pub username: String,
    pub message: String,
}

/// `user-joined` / `user-left` payload
#[derive(Debug, Clone, Serialize)]
pub struct PresenceNotice {
    pub username: String,
    pub message: String,
    pub room: String,
}

/// `user-typing` payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub username: String,
    pub is_typing: bool,
}

/// `error` payload
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// First human-readable message out of a set of validation errors
#[must_use]
pub fn validation_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| errors.iter().map(move |e| (field, e)))
        .map(|(field, error)| {
            error
                .message
                .as_ref()
                .map_or_else(|| format!("Invalid {field}"), ToString::to_string)
        })
        .next()
        .unwrap_or_else(|| "Invalid payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomchat_core::{
        MESSAGE_MAX_LEN, ROOM_MAX_LEN, ROOM_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
    };

    fn join(username: &str, room: &str) -> JoinRoomPayload {
        JoinRoomPayload {
            username: username.to_string(),
            room: room.to_string(),
        }
    }

    #[test]
    fn test_join_trims_names() {
        let payload = join("  alice ", "\tgeneral\n").into_validated().unwrap();
        assert_eq!(payload.username, "alice");
        assert_eq!(payload.room, "general");
    }

    #[test]
    fn test_join_length_bounds() {
        let min_user = "a".repeat(USERNAME_MIN_LEN);
        let max_user = "a".repeat(USERNAME_MAX_LEN);
        let min_room = "r".repeat(ROOM_MIN_LEN);
        let max_room = "r".repeat(ROOM_MAX_LEN);

        assert!(join(&min_user, &min_room).into_validated().is_ok());
        assert!(join(&max_user, &max_room).into_validated().is_ok());

        assert!(join("a", "general").into_validated().is_err());
        assert!(join(&"a".repeat(USERNAME_MAX_LEN + 1), "general").into_validated().is_err());
        assert!(join("alice", "r").into_validated().is_err());
        assert!(join("alice", &"r".repeat(ROOM_MAX_LEN + 1)).into_validated().is_err());
    }

    #[test]
    fn test_join_blank_names_rejected() {
        let errors = join("   ", "general").into_validated().unwrap_err();
        assert_eq!(validation_message(&errors), "Username must be 2-20 characters");
    }

    #[test]
    fn test_lengths_count_characters() {
        // 20 multi-byte characters are within bounds
        let name: String = "é".repeat(USERNAME_MAX_LEN);
        assert!(join(&name, "général").into_validated().is_ok());
    }

    #[test]
    fn test_message_bounds() {
        let ok = SendMessagePayload {
            message: "  hi  ".to_string(),
        }
        .into_validated()
        .unwrap();
        assert_eq!(ok.message, "hi");

        let blank = SendMessagePayload {
            message: "   ".to_string(),
        };
        assert!(blank.into_validated().is_err());

        let long = SendMessagePayload {
            message: "x".repeat(MESSAGE_MAX_LEN + 1),
        };
        assert!(long.into_validated().is_err());
    }

    #[test]
    fn test_typing_payload_is_camel_case() {
        let json = serde_json::to_value(TypingPayload {
            username: "alice".to_string(),
            is_typing: true,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"username": "alice", "isTyping": true}));
    }
}
