//! Presence tracker
//!
//! Which local connection is joined to which room under which name. Only this
//! process's event handlers mutate it; the participant store holds the
//! cross-process view.

use dashmap::DashMap;
use roomchat_core::Participant;
use std::collections::BTreeSet;

/// Connection id to participant, for connections on this process
#[derive(Debug, Default)]
pub struct PresenceTracker {
    participants: DashMap<String, Participant>,
}

impl PresenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection as joined, returning whatever it replaced
    pub fn set_active(&self, connection_id: &str, participant: Participant) -> Option<Participant> {
        self.participants.insert(connection_id.to_string(), participant)
    }

    /// Forget a connection. Only the first call for a membership returns it.
    pub fn clear(&self, connection_id: &str) -> Option<Participant> {
        self.participants.remove(connection_id).map(|(_, participant)| participant)
    }

    /// Current participant for a connection
    pub fn get(&self, connection_id: &str) -> Option<Participant> {
        self.participants.get(connection_id).map(|p| p.value().clone())
    }

    /// Distinct rooms with at least one local participant, sorted
    pub fn rooms(&self) -> Vec<String> {
        self.participants
            .iter()
            .map(|entry| entry.value().room.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Local participants of a room, ordered by join time
    pub fn room_participants(&self, room: &str) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self
            .participants
            .iter()
            .filter(|entry| entry.value().is_in(room))
            .map(|entry| entry.value().clone())
            .collect();
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        participants
    }

    /// Number of joined local connections
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
