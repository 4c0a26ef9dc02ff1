//! Message ID - time-ordered 64-bit identifier
//!
//! Layout:
//! - Bits 63-22: Milliseconds since the custom epoch
//! - Bits 21-12: Worker ID (0-1023), one per server process
//! - Bits 11-0:  Per-millisecond sequence (0-4095)
//!
//! IDs produced by one generator are strictly increasing, so sorting by ID
//! sorts by creation time within a process.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Time-ordered message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MessageId(i64);

impl MessageId {
    /// Custom epoch: 2024-01-01 00:00:00 UTC (milliseconds)
    pub const EPOCH: i64 = 1_704_067_200_000;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Creation time in milliseconds since the Unix epoch
    #[inline]
    pub fn timestamp_millis(&self) -> i64 {
        (self.0 >> 22) + Self::EPOCH
    }

    #[inline]
    pub fn worker_id(&self) -> u16 {
        ((self.0 >> 12) & 0x3FF) as u16
    }

    #[inline]
    pub fn sequence(&self) -> u16 {
        (self.0 & 0xFFF) as u16
    }

    pub fn parse(s: &str) -> Result<Self, MessageIdParseError> {
        s.parse::<i64>()
            .map(MessageId)
            .map_err(|_| MessageIdParseError::InvalidFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageIdParseError {
    #[error("invalid message id: {0}")]
    InvalidFormat(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for MessageId {
    type Err = MessageIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageId::parse(s)
    }
}

// Serialized as a string: browsers parse JSON numbers as f64
impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct MessageIdVisitor;

        impl Visitor<'_> for MessageIdVisitor {
            type Value = MessageId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer message id")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<MessageId, E> {
                Ok(MessageId(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<MessageId, E> {
                i64::try_from(value)
                    .map(MessageId)
                    .map_err(|_| de::Error::custom("message id out of range"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<MessageId, E> {
                MessageId::parse(value).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(MessageIdVisitor)
    }
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: i64,
    sequence: i64,
}

/// Per-process message ID generator
///
/// Holds the last timestamp and sequence behind a mutex; generation is a few
/// arithmetic operations so contention is negligible at chat message rates.
#[derive(Debug)]
pub struct MessageIdGenerator {
    worker_id: u16,
    state: Mutex<GeneratorState>,
}

impl MessageIdGenerator {
    /// Create a generator for the given worker.
    ///
    /// # Panics
    /// Panics if `worker_id >= 1024`.
    pub fn new(worker_id: u16) -> Self {
        assert!(worker_id < 1024, "Worker ID must be < 1024");
        Self {
            worker_id,
            state: Mutex::new(GeneratorState::default()),
        }
    }

    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    /// Generate the next ID.
    ///
    /// A clock that moves backwards is treated as standing still, which keeps
    /// IDs monotonic at the cost of borrowing sequence numbers.
    pub fn generate(&self) -> MessageId {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut now = current_millis().max(state.last_millis);

        if now == state.last_millis {
            state.sequence = (state.sequence + 1) & 0xFFF;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond
                now += 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_millis = now;

        let id = ((now - MessageId::EPOCH) << 22)
            | (i64::from(self.worker_id) << 12)
            | state.sequence;
        MessageId::new(id)
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

fn current_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
