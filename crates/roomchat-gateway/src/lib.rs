//! # roomchat-gateway
//!
//! WebSocket chat rooms with an HTTP introspection surface. Runs alone with
//! in-memory stores, or as one of several processes sharing Redis.

pub mod api;
pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod presence;
pub mod protocol;
pub mod server;

pub use server::{create_app, create_gateway_state, run, GatewayState, StoreMode};
