//! Participant entity - one joined connection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A connection's live membership in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Connection ID
    pub id: String,
    pub username: String,
    pub room: String,
    pub joined_at: DateTime<Utc>,
}

/// The `{id, username}` pair broadcast in room user lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: String,
    pub username: String,
}

impl Participant {
    /// Create a participant joined now
    pub fn new(
        connection_id: impl Into<String>,
        username: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            id: connection_id.into(),
            username: username.into(),
            room: room.into(),
            joined_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_in(&self, room: &str) -> bool {
        self.room == room
    }

    pub fn summary(&self) -> ParticipantSummary {
        ParticipantSummary {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}
