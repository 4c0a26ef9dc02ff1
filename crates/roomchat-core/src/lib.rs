//! # roomchat-core
//!
//! Domain layer for the room chat server: participants, chat messages, message ids,
//! and the store traits the infrastructure layer implements.
//! This crate has zero dependencies on infrastructure (Redis, web framework, etc.).

pub mod entities;
pub mod error;
pub mod limits;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{ChatMessage, Participant, ParticipantSummary};
pub use error::DomainError;
pub use limits::{
    HISTORY_REPLAY_LIMIT, MESSAGE_LOG_CAP, MESSAGE_MAX_LEN, PARTICIPANT_TTL_SECS, ROOM_MAX_LEN,
    ROOM_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
pub use traits::{MessageLog, ParticipantStore, RepoResult};
pub use value_objects::{MessageId, MessageIdGenerator, MessageIdParseError};
