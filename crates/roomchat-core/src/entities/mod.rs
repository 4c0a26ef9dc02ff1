//! Domain entities - core business objects

mod message;
mod participant;

pub use message::ChatMessage;
pub use participant::{Participant, ParticipantSummary};
