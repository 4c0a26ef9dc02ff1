//! Pub/Sub channel definitions.
//!
//! Every room has one channel; processes subscribe while they hold at least
//! one local member of the room.

/// Channel prefix for room fan-out
pub const ROOM_CHANNEL_PREFIX: &str = "chat:room:";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Events for every member of a room
    Room(String),
    /// Custom channel name
    Custom(String),
}

impl PubSubChannel {
    /// Create a room channel
    #[must_use]
    pub fn room(name: impl Into<String>) -> Self {
        Self::Room(name.into())
    }

    /// Create a custom channel
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Room(room) => format!("{ROOM_CHANNEL_PREFIX}{room}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Room this channel carries, if it is a room channel
    #[must_use]
    pub fn room_name(&self) -> Option<&str> {
        match self {
            Self::Room(room) => Some(room),
            Self::Custom(_) => None,
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.strip_prefix(ROOM_CHANNEL_PREFIX) {
            Some(room) if !room.is_empty() => Self::Room(room.to_string()),
            _ => Self::Custom(name.to_string()),
        }
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
