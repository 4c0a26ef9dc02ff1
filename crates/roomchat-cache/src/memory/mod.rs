//! In-memory store implementations.
//!
//! Used when Redis is unreachable at startup: a single process then owns all
//! state, and nothing is shared or survives a restart.

mod message_log;
mod participant_store;

pub use message_log::MemoryMessageLog;
pub use participant_store::MemoryParticipantStore;
