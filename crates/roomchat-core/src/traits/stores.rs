//! Store traits - the persistence interface the event router depends on
//!
//! The domain layer defines what it needs; `roomchat-cache` provides a Redis
//! implementation and an in-memory one for single-node mode.

use async_trait::async_trait;

use crate::entities::{ChatMessage, Participant};
use crate::error::DomainError;

/// Result type for store operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Participant Store
// ============================================================================

/// Cross-process view of who is joined where.
///
/// Records expire after [`crate::PARTICIPANT_TTL_SECS`] even when never removed.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Persist a participant record and add it to its room's membership
    async fn save(&self, participant: &Participant) -> RepoResult<()>;

    /// Delete a participant record and drop it from its room's membership
    async fn remove(&self, participant: &Participant) -> RepoResult<()>;

    /// Find the record for a connection
    async fn find(&self, connection_id: &str) -> RepoResult<Option<Participant>>;

    /// All live participants of a room, ordered by join time
    async fn room_participants(&self, room: &str) -> RepoResult<Vec<Participant>>;
}

// ============================================================================
// Message Log
// ============================================================================

/// Bounded, ordered message history per room.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Append a message, trimming the room to [`crate::MESSAGE_LOG_CAP`] entries
    async fn append(&self, message: &ChatMessage) -> RepoResult<()>;

    /// Up to `limit` most recent messages of a room, oldest first
    async fn recent(&self, room: &str, limit: usize) -> RepoResult<Vec<ChatMessage>>;
}
