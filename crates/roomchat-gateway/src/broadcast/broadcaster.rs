//! Broadcaster
//!
//! Room-scoped delivery: local members first, then a Redis publish stamped with
//! this node's id so the other processes can deliver to theirs.

use crate::connection::{ConnectionManager, RoomChange};
use crate::protocol::ServerFrame;
use roomchat_cache::{PubSubChannel, Publisher, Subscriber};
use std::sync::Arc;
use tokio::sync::Mutex;

struct Fanout {
    publisher: Publisher,
    subscriber: Arc<Subscriber>,
}

/// Delivers frames to rooms across every server process
pub struct Broadcaster {
    node_id: String,
    connections: Arc<ConnectionManager>,
    fanout: Option<Fanout>,
    /// Serializes routing changes with their subscribe/unsubscribe commands
    membership: Mutex<()>,
}

impl Broadcaster {
    /// Broadcaster for single-node mode: local delivery only
    #[must_use]
    pub fn local(node_id: impl Into<String>, connections: Arc<ConnectionManager>) -> Self {
        Self {
            node_id: node_id.into(),
            connections,
            fanout: None,
            membership: Mutex::new(()),
        }
    }

    /// Broadcaster that also publishes through Redis
    #[must_use]
    pub fn distributed(
        node_id: impl Into<String>,
        connections: Arc<ConnectionManager>,
        publisher: Publisher,
        subscriber: Arc<Subscriber>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            connections,
            fanout: Some(Fanout {
                publisher,
                subscriber,
            }),
            membership: Mutex::new(()),
        }
    }

    /// Id stamped on published envelopes
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Whether events reach other processes
    pub fn is_distributed(&self) -> bool {
        self.fanout.is_some()
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Start routing a room's events to a connection
    pub async fn enter_room(&self, connection_id: &str, room: &str) {
        let _guard = self.membership.lock().await;
        let change = self.connections.enter_room(connection_id, room);
        self.apply(room, change).await;
    }

    /// Stop routing a room's events to a connection
    pub async fn leave_room(&self, connection_id: &str, room: &str) {
        let _guard = self.membership.lock().await;
        let change = self.connections.leave_room(connection_id, room);
        self.apply(room, change).await;
    }

    /// Drop a connection from the routing table
    pub async fn forget_connection(&self, connection_id: &str) {
        let _guard = self.membership.lock().await;
        if let Some((room, change)) = self.connections.remove_connection(connection_id) {
            self.apply(&room, change).await;
        }
    }

    async fn apply(&self, room: &str, change: RoomChange) {
        let Some(fanout) = &self.fanout else {
            return;
        };

        let channel = [PubSubChannel::room(room)];
        match change {
            RoomChange::Opened => fanout.subscriber.subscribe(&channel).await,
            RoomChange::Closed => fanout.subscriber.unsubscribe(&channel).await,
            RoomChange::Unchanged => return,
        }

        tracing::debug!(room = %room, change = ?change, "Room subscription updated");
    }

    /// Send a frame to one local connection
    pub fn to_connection(&self, connection_id: &str, frame: ServerFrame) -> bool {
        self.connections.send_to(connection_id, frame)
    }

    /// Send a frame to every member of a room on every process, except `exclude`
    pub async fn to_room(&self, room: &str, frame: ServerFrame, exclude: Option<&str>) {
        let excluded: Vec<String> = exclude.map(str::to_string).into_iter().collect();
        let sent = self.connections.send_to_room(room, &frame, &excluded);

        tracing::debug!(
            room = %room,
            event = %frame.event,
            local = sent,
            "Room event delivered locally"
        );

        let Some(fanout) = &self.fanout else {
            return;
        };

        if let Err(e) = fanout
            .publisher
            .publish_to_room(room, &self.node_id, frame.event.as_str(), frame.data, exclude)
            .await
        {
            tracing::warn!(room = %room, error = %e, "Failed to publish room event");
        }
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("node_id", &self.node_id)
            .field("distributed", &self.is_distributed())
            .finish()
    }
}
