//! # roomchat-cache
//!
//! Store layer for the room chat server.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Stores**: Redis participant store and message log implementing the core traits
//! - **Memory Stores**: The same contracts held in process memory for single-node mode
//! - **Pub/Sub**: Room event fan-out across server processes
//!
//! ## Example
//!
//! ```ignore
//! use roomchat_cache::{
//!     Publisher, RedisMessageLog, RedisParticipantStore, RedisPool, RedisPoolConfig,
//! };
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let participants = RedisParticipantStore::new(pool.clone());
//! let messages = RedisMessageLog::new(pool.clone());
//! let publisher = Publisher::new(pool);
//!
//! participants.save(&Participant::new(conn_id, "alice", "general")).await?;
//! publisher
//!     .publish_to_room("general", node_id, "user-joined", data, Some(conn_id))
//!     .await?;
//! ```

pub mod memory;
pub mod pool;
pub mod pubsub;
pub mod store;

// Re-export pool types
pub use pool::{
    PoolStatus, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult,
};

// Re-export store types
pub use memory::{MemoryMessageLog, MemoryParticipantStore};
pub use store::{RedisMessageLog, RedisParticipantStore};

// Re-export pubsub types
pub use pubsub::{
    EventTarget, PubSubChannel, PubSubEvent, Publisher, ReceivedMessage, Subscriber,
    SubscriberBuilder, SubscriberConfig, SubscriberError, SubscriberResult, ROOM_CHANNEL_PREFIX,
};
