//! Redis-backed message log.
//!
//! Messages live in `message:{id}` hashes; `room:{room}:messages` is a sorted
//! set of ids scored by arrival time. Appending and trimming run as one Lua
//! script, so the index never holds more than the cap and never points at a
//! deleted record.

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use roomchat_core::{ChatMessage, DomainError, MessageLog, RepoResult, MESSAGE_LOG_CAP};
use std::collections::HashMap;

use crate::pool::RedisPool;
use crate::store::keys::{message_key, room_messages_key, MESSAGE_KEY_PREFIX};
use crate::store::mappers::{message_fields, message_from_hash};

/// KEYS[1] message hash, KEYS[2] room index
/// ARGV[1] score, ARGV[2] id, ARGV[3] cap, ARGV[4] message key prefix, ARGV[5..] hash fields
const APPEND_SCRIPT: &str = r"
redis.call('HSET', KEYS[1], unpack(ARGV, 5))
redis.call('ZADD', KEYS[2], ARGV[1], ARGV[2])
local cap = tonumber(ARGV[3])
local overflow = redis.call('ZRANGE', KEYS[2], 0, -(cap + 1))
for _, id in ipairs(overflow) do
    redis.call('DEL', ARGV[4] .. id)
end
if #overflow > 0 then
    redis.call('ZREMRANGEBYRANK', KEYS[2], 0, #overflow - 1)
end
return #overflow
";

/// Message log backed by Redis hashes and a sorted-set index
#[derive(Clone)]
pub struct RedisMessageLog {
    pool: RedisPool,
    append_script: Script,
    cap: usize,
}

impl RedisMessageLog {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self::with_cap(pool, MESSAGE_LOG_CAP)
    }

    /// Log that keeps `cap` messages per room
    #[must_use]
    pub fn with_cap(pool: RedisPool, cap: usize) -> Self {
        Self {
            pool,
            append_script: Script::new(APPEND_SCRIPT),
            cap: cap.max(1),
        }
    }
}

#[async_trait]
impl MessageLog for RedisMessageLog {
    async fn append(&self, message: &ChatMessage) -> RepoResult<()> {
        let mut conn = self.pool.get().await?;
        let fields = message_fields(message);

        let trimmed: usize = self
            .append_script
            .key(message_key(message.id))
            .key(room_messages_key(&message.room))
            .arg(message.arrival_millis())
            .arg(message.id.to_string())
            .arg(self.cap)
            .arg(MESSAGE_KEY_PREFIX)
            .arg(&fields)
            .invoke_async(&mut conn)
            .await
            .map_err(DomainError::store)?;

        tracing::debug!(
            message_id = %message.id,
            room = %message.room,
            trimmed = trimmed,
            "Message appended"
        );
        Ok(())
    }

    async fn recent(&self, room: &str, limit: usize) -> RepoResult<Vec<ChatMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let start = -(limit.min(self.cap) as isize);

        let ids: Vec<String> = conn
            .zrange(room_messages_key(room), start, -1)
            .await
            .map_err(DomainError::store)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(message_key(id));
        }
        let hashes: Vec<HashMap<String, String>> = pipe
            .query_async(&mut conn)
            .await
            .map_err(DomainError::store)?;

        let messages = ids
            .iter()
            .zip(hashes)
            .filter(|(_, hash)| !hash.is_empty())
            .filter_map(|(id, hash)| match message_from_hash(&message_key(id), hash) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable message record");
                    None
                }
            })
            .collect();

        Ok(messages)
    }
}
