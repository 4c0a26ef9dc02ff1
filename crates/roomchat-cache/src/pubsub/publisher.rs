//! Redis Pub/Sub publisher.
//!
//! Publishes room events so that every process holding members of the room
//! can deliver them to its own sockets.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Event wrapper for Pub/Sub messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Client-facing event name (e.g., "new-message", "user-left")
    pub event_type: String,
    /// Event payload, forwarded to clients as-is
    pub data: serde_json::Value,
    /// Node that published the event; that node has already delivered locally
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub origin: Option<String>,
    /// Routing information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EventTarget>,
}

/// Target information for event routing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTarget {
    /// Room whose members receive the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Connection ids that must not receive this event
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub exclude_connections: Vec<String>,
}

impl PubSubEvent {
    /// Create a new event
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            origin: None,
            target: None,
        }
    }

    /// Stamp the publishing node
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Add target information
    #[must_use]
    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// True when `node_id` published this event
    #[must_use]
    pub fn is_from(&self, node_id: &str) -> bool {
        self.origin.as_deref() == Some(node_id)
    }

    /// Connections excluded from delivery
    #[must_use]
    pub fn excluded(&self) -> &[String] {
        self.target
            .as_ref()
            .map_or(&[], |target| target.exclude_connections.as_slice())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl EventTarget {
    /// Target every member of a room
    #[must_use]
    pub fn room(room: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            exclude_connections: Vec::new(),
        }
    }

    /// Add connection to exclude list
    #[must_use]
    pub fn exclude_connection(mut self, conn_id: impl Into<String>) -> Self {
        self.exclude_connections.push(conn_id.into());
        self
    }
}

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel, returning the number of subscribed processes
    pub async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = %event.event_type,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }

    /// Publish an event to the members of `room`
    pub async fn publish_to_room(
        &self,
        room: &str,
        origin: &str,
        event_type: &str,
        data: serde_json::Value,
        exclude: Option<&str>,
    ) -> RedisResult<u32> {
        let mut target = EventTarget::room(room);
        if let Some(conn_id) = exclude {
            target = target.exclude_connection(conn_id);
        }

        let event = PubSubEvent::new(event_type, data)
            .with_origin(origin)
            .with_target(target);

        self.publish(&PubSubChannel::room(room), &event).await
    }
}
