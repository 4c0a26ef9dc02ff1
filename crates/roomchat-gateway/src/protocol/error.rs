//! Frame decoding errors

use thiserror::Error;

/// Why an inbound frame could not be turned into a client event
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, or not shaped like `{"event", "data"}`
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// Event name unknown or reserved for the server
    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    /// Event known but its payload does not decode
    #[error("Invalid payload for {event}: {source}")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Binary frames are not part of the protocol
    #[error("Binary frames are not supported")]
    BinaryFrame,
}

impl ProtocolError {
    /// Error code sent back in the `error` event
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedFrame(_) | Self::BinaryFrame => "MALFORMED_FRAME",
            Self::UnsupportedEvent(_) => "UNSUPPORTED_EVENT",
            Self::InvalidPayload { .. } => "INVALID_PAYLOAD",
        }
    }
}
