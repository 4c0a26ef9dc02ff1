//! Event broadcasting
//!
//! Room events are delivered to local members directly and published to Redis
//! for every other process; the dispatcher delivers what other processes
//! publish.

mod broadcaster;
mod dispatcher;

pub use broadcaster::Broadcaster;
pub use dispatcher::EventDispatcher;
