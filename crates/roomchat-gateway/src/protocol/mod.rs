//! Wire protocol
//!
//! Every WebSocket frame is a JSON text frame `{"event": "<name>", "data": <payload>}`.

mod error;
mod event_types;
mod messages;
mod payloads;

pub use error::ProtocolError;
pub use event_types::EventType;
pub use messages::{ClientEvent, ServerFrame};
pub use payloads::{
    validation_message, ErrorPayload, JoinRoomPayload, PresenceNotice, RoomJoinedPayload,
    SendMessagePayload, TypingPayload,
};
