//! Event names carried in the `event` field of every frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protocol event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    // Client -> server
    /// Enter a room under a display name
    JoinRoom,
    /// Post a message to the current room
    SendMessage,
    TypingStart,
    TypingStop,

    // Server -> client
    /// Private confirmation of a join
    RoomJoined,
    /// Someone else entered the room
    UserJoined,
    /// Someone left the room or disconnected
    UserLeft,
    /// Current participant list
    RoomUsers,
    /// Replay of recent messages, sent only to the joiner
    ChatHistory,
    NewMessage,
    UserTyping,
    /// Private rejection of a frame or join
    Error,
}

impl EventType {
    const ALL: [Self; 12] = [
        Self::JoinRoom,
        Self::SendMessage,
        Self::TypingStart,
        Self::TypingStop,
        Self::RoomJoined,
        Self::UserJoined,
        Self::UserLeft,
        Self::RoomUsers,
        Self::ChatHistory,
        Self::NewMessage,
        Self::UserTyping,
        Self::Error,
    ];

    /// Wire name of the event
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JoinRoom => "join-room",
            Self::SendMessage => "send-message",
            Self::TypingStart => "typing-start",
            Self::TypingStop => "typing-stop",
            Self::RoomJoined => "room-joined",
            Self::UserJoined => "user-joined",
            Self::UserLeft => "user-left",
            Self::RoomUsers => "room-users",
            Self::ChatHistory => "chat-history",
            Self::NewMessage => "new-message",
            Self::UserTyping => "user-typing",
            Self::Error => "error",
        }
    }

    /// Whether clients may send this event
    #[must_use]
    pub fn is_client_event(&self) -> bool {
        matches!(
            self,
            Self::JoinRoom | Self::SendMessage | Self::TypingStart | Self::TypingStop
        )
    }

    /// Whether the event counts against the connection's rate limit
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::SendMessage | Self::TypingStart | Self::TypingStop)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
