//! Client event handlers
//!
//! The [`EventRouter`] applies each decoded client event to presence, the
//! stores and the broadcaster, in the order the connection sent them.

mod error;
mod router;

pub use error::{HandlerError, HandlerResult};
pub use router::EventRouter;
