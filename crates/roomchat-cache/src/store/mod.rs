//! Redis implementations of the core store traits.

pub mod keys;
mod mappers;
mod message_log;
mod participant_store;

pub use message_log::RedisMessageLog;
pub use participant_store::RedisParticipantStore;
