//! Connection management
//!
//! Tracks live WebSocket connections, their outbound channels, and which local
//! connections sit in which room.

mod connection;
mod manager;
mod rate_limit;

pub use connection::{Connection, DeliveryError};
pub use manager::{ConnectionManager, RoomChange};
pub use rate_limit::EventRateLimiter;
