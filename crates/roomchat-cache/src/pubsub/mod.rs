//! Redis Pub/Sub module.
//!
//! Provides cross-process fan-out of room events.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, ROOM_CHANNEL_PREFIX};
pub use publisher::{EventTarget, PubSubEvent, Publisher};
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult,
};
