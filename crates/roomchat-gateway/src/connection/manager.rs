//! Connection manager
//!
//! Process-local routing table: connection id to outbound channel, and room to
//! the local connection ids in it. Uses DashMap for concurrent access.

use super::{Connection, DeliveryError, EventRateLimiter};
use crate::protocol::ServerFrame;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Effect of a membership change on the room's local population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomChange {
    /// The room gained its first local member
    Opened,
    /// The room lost its last local member
    Closed,
    /// The room was open before and still is
    Unchanged,
}

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by id
    connections: DashMap<String, Arc<Connection>>,

    /// Room name to local connection ids
    rooms: DashMap<String, HashSet<String>>,

    /// Connection id to the room it is routed in
    memberships: DashMap<String, String>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection
    pub fn add_connection(
        &self,
        id: String,
        sender: mpsc::Sender<ServerFrame>,
        limiter: EventRateLimiter,
    ) -> Arc<Connection> {
        let connection = Arc::new(Connection::new(id.clone(), sender, limiter));
        self.connections.insert(id.clone(), Arc::clone(&connection));

        tracing::debug!(connection_id = %id, "Connection added");

        connection
    }

    /// Remove a connection, dropping any room routing it still holds.
    ///
    /// Returns the room it was still routed in and how that room changed.
    pub fn remove_connection(&self, id: &str) -> Option<(String, RoomChange)> {
        self.connections.remove(id)?;

        let leftover = self
            .memberships
            .get(id)
            .map(|room| room.value().clone())
            .map(|room| {
                let change = self.leave_room(id, &room);
                (room, change)
            });

        tracing::debug!(connection_id = %id, "Connection removed");

        leftover
    }

    /// Get a connection by id
    pub fn get_connection(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|c| Arc::clone(c.value()))
    }

    /// Route a connection's room traffic to it
    pub fn enter_room(&self, id: &str, room: &str) -> RoomChange {
        let opened = {
            let mut members = self.rooms.entry(room.to_string()).or_default();
            let opened = members.is_empty();
            members.insert(id.to_string());
            opened
        };
        self.memberships.insert(id.to_string(), room.to_string());

        tracing::trace!(connection_id = %id, room = %room, "Connection entered room");

        if opened {
            RoomChange::Opened
        } else {
            RoomChange::Unchanged
        }
    }

    /// Stop routing a room's traffic to a connection
    pub fn leave_room(&self, id: &str, room: &str) -> RoomChange {
        self.memberships.remove_if(id, |_, current| current == room);

        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => members.remove(id),
            None => false,
        };
        if !removed {
            return RoomChange::Unchanged;
        }

        tracing::trace!(connection_id = %id, room = %room, "Connection left room");

        if self.rooms.remove_if(room, |_, members| members.is_empty()).is_some() {
            RoomChange::Closed
        } else {
            RoomChange::Unchanged
        }
    }

    /// Room a connection is routed in
    pub fn room_of(&self, id: &str) -> Option<String> {
        self.memberships.get(id).map(|room| room.value().clone())
    }

    /// Get all local connections in a room
    pub fn room_connections(&self, room: &str) -> Vec<Arc<Connection>> {
        self.rooms
            .get(room)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| self.get_connection(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Send a frame to one connection
    pub fn send_to(&self, id: &str, frame: ServerFrame) -> bool {
        match self.get_connection(id) {
            Some(connection) => deliver(&connection, frame),
            None => false,
        }
    }

    /// Send a frame to every local connection in a room except `exclude`
    pub fn send_to_room(&self, room: &str, frame: &ServerFrame, exclude: &[String]) -> usize {
        let sent = self
            .room_connections(room)
            .iter()
            .filter(|connection| !exclude.iter().any(|id| id == connection.id()))
            .filter(|connection| deliver(connection, frame.clone()))
            .count();

        tracing::trace!(
            room = %room,
            event = %frame.event,
            sent = sent,
            "Frame sent to room connections"
        );

        sent
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of rooms with local connections
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Check if a connection exists
    pub fn has_connection(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }
}

fn deliver(connection: &Connection, frame: ServerFrame) -> bool {
    match connection.deliver(frame) {
        Ok(()) => true,
        Err(DeliveryError::QueueFull) => {
            tracing::warn!(connection_id = %connection.id(), "Outbound queue full, frame dropped");
            false
        }
        Err(DeliveryError::Closed) => {
            tracing::debug!(connection_id = %connection.id(), "Connection closed, frame dropped");
            false
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
