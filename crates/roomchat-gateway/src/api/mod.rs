//! HTTP surface
//!
//! Health, local room listing, and read-only views of the persisted state.

mod handlers;
mod middleware;
mod response;

pub use handlers::{
    health_check, list_rooms, room_messages, room_users, store_status, HealthResponse,
    RoomMessagesResponse, RoomUsersResponse, RoomsResponse, StoreStatus, StoreStatusResponse,
};
pub use middleware::{apply_middleware, REQUEST_ID_HEADER};
pub use response::{ApiError, ApiResult, ErrorBody, ErrorDetail};

use crate::server::GatewayState;
use axum::{routing::get, Router};

/// HTTP routes, without middleware
pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/rooms", get(list_rooms))
        .route("/api/redis/status", get(store_status))
        .route("/api/redis/room/:room/messages", get(room_messages))
        .route("/api/redis/room/:room/users", get(room_users))
}
