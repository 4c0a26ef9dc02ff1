//! Redis-backed participant store.
//!
//! Each joined connection is a hash at `user:{connId}` plus a member of
//! `room:{room}:users`. Both keys carry a 24 hour TTL so records of crashed
//! processes disappear on their own.

use async_trait::async_trait;
use redis::AsyncCommands;
use roomchat_core::{DomainError, Participant, ParticipantStore, RepoResult, PARTICIPANT_TTL_SECS};
use std::collections::HashMap;

use crate::pool::RedisPool;
use crate::store::keys::{room_users_key, user_key};
use crate::store::mappers::{participant_fields, participant_from_hash};

/// Participant store backed by Redis hashes and sets
#[derive(Clone)]
pub struct RedisParticipantStore {
    pool: RedisPool,
    ttl_secs: i64,
}

impl RedisParticipantStore {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            ttl_secs: PARTICIPANT_TTL_SECS as i64,
        }
    }

    /// Drop set members whose record has already expired
    async fn prune(&self, room: &str, stale: &[String]) {
        if stale.is_empty() {
            return;
        }

        let result: Result<(), DomainError> = async {
            let mut conn = self.pool.get().await?;
            conn.srem::<_, _, ()>(room_users_key(room), stale)
                .await
                .map_err(DomainError::store)
        }
        .await;

        match result {
            Ok(()) => {
                tracing::debug!(room = %room, pruned = stale.len(), "Pruned stale room members");
            }
            Err(e) => {
                tracing::warn!(room = %room, error = %e, "Failed to prune stale room members");
            }
        }
    }
}

#[async_trait]
impl ParticipantStore for RedisParticipantStore {
    async fn save(&self, participant: &Participant) -> RepoResult<()> {
        let mut conn = self.pool.get().await?;
        let key = user_key(&participant.id);
        let room_key = room_users_key(&participant.room);

        redis::pipe()
            .atomic()
            .hset_multiple(&key, &participant_fields(participant))
            .ignore()
            .expire(&key, self.ttl_secs)
            .ignore()
            .sadd(&room_key, &participant.id)
            .ignore()
            .expire(&room_key, self.ttl_secs)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(DomainError::store)?;

        tracing::debug!(
            connection_id = %participant.id,
            room = %participant.room,
            "Participant saved"
        );
        Ok(())
    }

    async fn remove(&self, participant: &Participant) -> RepoResult<()> {
        let mut conn = self.pool.get().await?;

        redis::pipe()
            .atomic()
            .srem(room_users_key(&participant.room), &participant.id)
            .ignore()
            .del(user_key(&participant.id))
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(DomainError::store)?;

        tracing::debug!(
            connection_id = %participant.id,
            room = %participant.room,
            "Participant removed"
        );
        Ok(())
    }

    async fn find(&self, connection_id: &str) -> RepoResult<Option<Participant>> {
        let mut conn = self.pool.get().await?;
        let key = user_key(connection_id);

        let hash: HashMap<String, String> = conn.hgetall(&key).await.map_err(DomainError::store)?;
        if hash.is_empty() {
            return Ok(None);
        }

        participant_from_hash(&key, hash).map(Some)
    }

    async fn room_participants(&self, room: &str) -> RepoResult<Vec<Participant>> {
        let mut conn = self.pool.get().await?;

        let ids: Vec<String> = conn
            .smembers(room_users_key(room))
            .await
            .map_err(DomainError::store)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(user_key(id));
        }
        let hashes: Vec<HashMap<String, String>> = pipe
            .query_async(&mut conn)
            .await
            .map_err(DomainError::store)?;
        drop(conn);

        let mut participants = Vec::with_capacity(ids.len());
        let mut stale = Vec::new();

        for (id, hash) in ids.into_iter().zip(hashes) {
            if hash.is_empty() {
                stale.push(id);
                continue;
            }

            let key = user_key(&id);
            match participant_from_hash(&key, hash) {
                Ok(participant) if participant.is_in(room) => participants.push(participant),
                Ok(_) => stale.push(id),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable participant record"),
            }
        }

        self.prune(room, &stale).await;

        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        Ok(participants)
    }
}
