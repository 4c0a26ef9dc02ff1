//! Store traits (ports)

mod stores;

pub use stores::{MessageLog, ParticipantStore, RepoResult};
