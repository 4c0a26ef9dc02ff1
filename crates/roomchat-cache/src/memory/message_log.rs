//! In-memory message log

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use roomchat_core::{ChatMessage, MessageLog, RepoResult, MESSAGE_LOG_CAP};
use tokio::sync::Mutex;

/// Bounded per-room history held in process memory
#[derive(Debug)]
pub struct MemoryMessageLog {
    rooms: Mutex<HashMap<String, VecDeque<ChatMessage>>>,
    cap: usize,
}

impl MemoryMessageLog {
    #[must_use]
    pub fn new() -> Self {
        Self::with_cap(MESSAGE_LOG_CAP)
    }

    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            cap: cap.max(1),
        }
    }
}

impl Default for MemoryMessageLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageLog for MemoryMessageLog {
    async fn append(&self, message: &ChatMessage) -> RepoResult<()> {
        let mut rooms = self.rooms.lock().await;
        let log = rooms.entry(message.room.clone()).or_default();

        log.push_back(message.clone());
        while log.len() > self.cap {
            log.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, room: &str, limit: usize) -> RepoResult<Vec<ChatMessage>> {
        let rooms = self.rooms.lock().await;
        let Some(log) = rooms.get(room) else {
            return Ok(Vec::new());
        };

        let skip = log.len().saturating_sub(limit);
        Ok(log.iter().skip(skip).cloned().collect())
    }
}
