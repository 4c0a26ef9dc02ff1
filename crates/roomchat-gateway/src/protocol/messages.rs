//! Frame formats
//!
//! Inbound text frames decode into [`ClientEvent`]; everything the server sends
//! is a [`ServerFrame`].

use super::{
    ErrorPayload, EventType, JoinRoomPayload, PresenceNotice, ProtocolError, RoomJoinedPayload,
    SendMessagePayload, TypingPayload,
};
use roomchat_core::{ChatMessage, ParticipantSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

/// A decoded client event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    JoinRoom(JoinRoomPayload),
    SendMessage(SendMessagePayload),
    TypingStart,
    TypingStop,
}

impl ClientEvent {
    /// Decode a text frame. Payloads are not validated here.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let raw: RawFrame = serde_json::from_str(text).map_err(ProtocolError::MalformedFrame)?;

        let event = raw
            .event
            .parse::<EventType>()
            .ok()
            .filter(EventType::is_client_event)
            .ok_or(ProtocolError::UnsupportedEvent(raw.event))?;

        let invalid = |source| ProtocolError::InvalidPayload {
            event: event.as_str(),
            source,
        };

        match event {
            EventType::JoinRoom => serde_json::from_value(raw.data)
                .map(Self::JoinRoom)
                .map_err(invalid),
            EventType::SendMessage => serde_json::from_value(raw.data)
                .map(Self::SendMessage)
                .map_err(invalid),
            EventType::TypingStart => Ok(Self::TypingStart),
            _ => Ok(Self::TypingStop),
        }
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::JoinRoom(_) => EventType::JoinRoom,
            Self::SendMessage(_) => EventType::SendMessage,
            Self::TypingStart => EventType::TypingStart,
            Self::TypingStop => EventType::TypingStop,
        }
    }
}

/// A frame sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFrame {
    pub event: EventType,
    pub data: Value,
}

impl ServerFrame {
    #[must_use]
    pub fn new(event: EventType, data: Value) -> Self {
        Self { event, data }
    }

    fn with_payload<T: Serialize>(event: EventType, payload: &T) -> Self {
        Self::new(event, serde_json::to_value(payload).unwrap_or_default())
    }

    /// Private join confirmation
    #[must_use]
    pub fn room_joined(room: &str, username: &str) -> Self {
        Self::with_payload(
            EventType::RoomJoined,
            &RoomJoinedPayload {
                room: room.to_string(),
                username: username.to_string(),
                message: format!("You joined {room}"),
            },
        )
    }

    #[must_use]
    pub fn user_joined(username: &str, room: &str) -> Self {
        Self::with_payload(
            EventType::UserJoined,
            &PresenceNotice {
                username: username.to_string(),
                message: format!("{username} joined the room"),
                room: room.to_string(),
            },
        )
    }

    #[must_use]
    pub fn user_left(username: &str, room: &str) -> Self {
        Self::with_payload(
            EventType::UserLeft,
            &PresenceNotice {
                username: username.to_string(),
                message: format!("{username} left the room"),
                room: room.to_string(),
            },
        )
    }

    #[must_use]
    pub fn room_users(users: &[ParticipantSummary]) -> Self {
        Self::with_payload(EventType::RoomUsers, &users)
    }

    #[must_use]
    pub fn chat_history(messages: &[ChatMessage]) -> Self {
        Self::with_payload(EventType::ChatHistory, &messages)
    }

    #[must_use]
    pub fn new_message(message: &ChatMessage) -> Self {
        Self::with_payload(EventType::NewMessage, message)
    }

    #[must_use]
    pub fn user_typing(username: &str, is_typing: bool) -> Self {
        Self::with_payload(
            EventType::UserTyping,
            &TypingPayload {
                username: username.to_string(),
                is_typing,
            },
        )
    }

    #[must_use]
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::with_payload(
            EventType::Error,
            &ErrorPayload {
                code: code.to_string(),
                message: message.into(),
            },
        )
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for ServerFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServerFrame(event={})", self.event)
    }
}
