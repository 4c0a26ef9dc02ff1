//! Process-local presence

mod tracker;

pub use tracker::PresenceTracker;
