//! Integration test utilities for the room chat server
//!
//! This crate provides helpers for running end-to-end tests against
//! the HTTP routes and the WebSocket endpoint.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
