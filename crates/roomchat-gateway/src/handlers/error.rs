//! Handler error types

use crate::protocol::ServerFrame;
use roomchat_core::DomainError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Join payload failed validation
    #[error("Invalid join: {0}")]
    InvalidJoin(String),

    /// Message body failed validation
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Event requires a joined connection
    #[error("Connection has not joined a room")]
    NotJoined,

    /// Per-connection event budget exhausted
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] DomainError),
}

impl HandlerError {
    /// Frame to send back to the offending connection, if any
    pub fn client_frame(&self) -> Option<ServerFrame> {
        match self {
            Self::InvalidJoin(message) => Some(ServerFrame::error("VALIDATION_ERROR", message)),
            _ => None,
        }
    }

    /// Whether the error comes from client input rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Result type for handlers
pub type HandlerResult<T> = Result<T, HandlerError>;
