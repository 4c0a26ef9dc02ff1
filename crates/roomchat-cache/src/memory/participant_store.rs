//! In-memory participant store

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use roomchat_core::{Participant, ParticipantStore, RepoResult, PARTICIPANT_TTL_SECS};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    records: HashMap<String, (Participant, Instant)>,
    rooms: HashMap<String, HashSet<String>>,
}

impl State {
    fn live(&self, connection_id: &str, now: Instant) -> Option<&Participant> {
        self.records
            .get(connection_id)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(participant, _)| participant)
    }
}

/// Participant store held in process memory, with the same expiry rules as Redis
#[derive(Debug)]
pub struct MemoryParticipantStore {
    state: Mutex<State>,
    ttl: Duration,
}

impl MemoryParticipantStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(PARTICIPANT_TTL_SECS))
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            ttl,
        }
    }
}

impl Default for MemoryParticipantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParticipantStore for MemoryParticipantStore {
    async fn save(&self, participant: &Participant) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        let expires_at = Instant::now() + self.ttl;

        state
            .records
            .insert(participant.id.clone(), (participant.clone(), expires_at));
        state
            .rooms
            .entry(participant.room.clone())
            .or_default()
            .insert(participant.id.clone());
        Ok(())
    }

    async fn remove(&self, participant: &Participant) -> RepoResult<()> {
        let mut state = self.state.lock().await;

        state.records.remove(&participant.id);
        if let Some(members) = state.rooms.get_mut(&participant.room) {
            members.remove(&participant.id);
            if members.is_empty() {
                state.rooms.remove(&participant.room);
            }
        }
        Ok(())
    }

    async fn find(&self, connection_id: &str) -> RepoResult<Option<Participant>> {
        let state = self.state.lock().await;
        Ok(state.live(connection_id, Instant::now()).cloned())
    }

    async fn room_participants(&self, room: &str) -> RepoResult<Vec<Participant>> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let Some(members) = state.rooms.get(room) else {
            return Ok(Vec::new());
        };

        let mut participants = Vec::with_capacity(members.len());
        let mut stale = Vec::new();
        for id in members {
            match state.live(id, now) {
                Some(participant) if participant.is_in(room) => {
                    participants.push(participant.clone());
                }
                _ => stale.push(id.clone()),
            }
        }

        for id in &stale {
            if let Some(members) = state.rooms.get_mut(room) {
                members.remove(id);
            }
            if state.live(id, now).is_none() {
                state.records.remove(id);
            }
        }

        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        Ok(participants)
    }
}
