//! Individual WebSocket connection

use super::EventRateLimiter;
use crate::protocol::ServerFrame;
use std::time::Instant;
use tokio::sync::mpsc;

/// Why a frame did not reach a connection's outbound queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("outbound queue full")]
    QueueFull,
    #[error("connection closed")]
    Closed,
}

/// A single WebSocket connection
pub struct Connection {
    /// Connection id (UUID v4)
    id: String,

    /// Channel to the socket's send task
    sender: mpsc::Sender<ServerFrame>,

    /// Token bucket for send-message and typing events
    limiter: EventRateLimiter,

    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    #[must_use]
    pub fn new(id: String, sender: mpsc::Sender<ServerFrame>, limiter: EventRateLimiter) -> Self {
        Self {
            id,
            sender,
            limiter,
            created_at: Instant::now(),
        }
    }

    /// Get the connection id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a frame without waiting; a slow client loses frames rather than stalling others
    pub fn deliver(&self, frame: ServerFrame) -> Result<(), DeliveryError> {
        self.sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Queue a frame, waiting for room in the outbound queue
    pub async fn send(&self, frame: ServerFrame) -> Result<(), DeliveryError> {
        self.sender.send(frame).await.map_err(|_| DeliveryError::Closed)
    }

    /// Take a rate limit token
    pub fn allow_event(&self) -> bool {
        self.limiter.try_acquire()
    }

    /// Check if the send task has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Get connection age
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish()
    }
}
