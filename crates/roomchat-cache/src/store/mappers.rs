//! Entity <-> Redis hash mappers
//!
//! - `*_fields`: flatten an entity into field/value pairs for `HSET`
//! - `*_from_hash`: rebuild an entity from an `HGETALL` reply

use chrono::{DateTime, Utc};
use roomchat_core::{ChatMessage, DomainError, MessageId, Participant};
use std::collections::HashMap;

/// Field/value pairs for a participant hash
pub fn participant_fields(participant: &Participant) -> Vec<(&'static str, String)> {
    vec![
        ("id", participant.id.clone()),
        ("username", participant.username.clone()),
        ("room", participant.room.clone()),
        ("joinedAt", participant.joined_at.to_rfc3339()),
    ]
}

/// Rebuild a participant from its hash
pub fn participant_from_hash(
    key: &str,
    mut hash: HashMap<String, String>,
) -> Result<Participant, DomainError> {
    let joined_at = parse_time(key, &take(key, &mut hash, "joinedAt")?)?;

    Ok(Participant {
        id: take(key, &mut hash, "id")?,
        username: take(key, &mut hash, "username")?,
        room: take(key, &mut hash, "room")?,
        joined_at,
    })
}

/// Field/value pairs for a message hash
pub fn message_fields(message: &ChatMessage) -> Vec<(&'static str, String)> {
    vec![
        ("id", message.id.to_string()),
        ("username", message.username.clone()),
        ("message", message.message.clone()),
        ("timestamp", message.timestamp.to_rfc3339()),
        ("room", message.room.clone()),
    ]
}

/// Rebuild a message from its hash
pub fn message_from_hash(
    key: &str,
    mut hash: HashMap<String, String>,
) -> Result<ChatMessage, DomainError> {
    let raw_id = take(key, &mut hash, "id")?;
    let id = MessageId::parse(&raw_id).map_err(|e| corrupt(key, e))?;
    let timestamp = parse_time(key, &take(key, &mut hash, "timestamp")?)?;

    Ok(ChatMessage {
        id,
        username: take(key, &mut hash, "username")?,
        message: take(key, &mut hash, "message")?,
        timestamp,
        room: take(key, &mut hash, "room")?,
    })
}

fn take(key: &str, hash: &mut HashMap<String, String>, field: &str) -> Result<String, DomainError> {
    hash.remove(field)
        .ok_or_else(|| corrupt(key, format!("missing field {field}")))
}

fn parse_time(key: &str, raw: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corrupt(key, e))
}

fn corrupt(key: &str, reason: impl std::fmt::Display) -> DomainError {
    DomainError::CorruptRecord {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
