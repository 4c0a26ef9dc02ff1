//! HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use roomchat_cache::PoolStatus;
use roomchat_core::{ChatMessage, MessageLog, Participant, ParticipantStore, MESSAGE_LOG_CAP};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::response::ApiResult;
use crate::server::{GatewayState, StoreMode};

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Rooms with participants on this process
#[derive(Debug, Serialize)]
pub struct RoomsResponse {
    pub rooms: Vec<String>,
}

/// Reachability of the shared store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Connected,
    Disconnected,
    /// Running in single-node mode
    Disabled,
}

#[derive(Debug, Serialize)]
pub struct StoreStatusResponse {
    pub status: StoreStatus,
    pub mode: StoreMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStatus>,
}

#[derive(Debug, Serialize)]
pub struct RoomMessagesResponse {
    pub room: String,
    pub count: usize,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct RoomUsersResponse {
    pub room: String,
    pub count: usize,
    pub users: Vec<Participant>,
}

/// `:room` path segment
#[derive(Debug, Deserialize, Validate)]
pub struct RoomPath {
    #[validate(length(min = 2, max = 30, message = "Room name must be 2-30 characters"))]
    room: String,
}

impl RoomPath {
    fn into_room(self) -> ApiResult<String> {
        let path = Self {
            room: self.room.trim().to_string(),
        };
        path.validate()?;
        Ok(path.room)
    }
}

/// Basic health check
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// GET /api/rooms
pub async fn list_rooms(State(state): State<GatewayState>) -> Json<RoomsResponse> {
    Json(RoomsResponse {
        rooms: state.presence().rooms(),
    })
}

/// Shared store reachability
///
/// GET /api/redis/status
pub async fn store_status(
    State(state): State<GatewayState>,
) -> (StatusCode, Json<StoreStatusResponse>) {
    let Some(pool) = state.redis() else {
        return (
            StatusCode::OK,
            Json(StoreStatusResponse {
                status: StoreStatus::Disabled,
                mode: state.mode(),
                pool: None,
            }),
        );
    };

    let (status, code) = match pool.health_check().await {
        Ok(()) => (StoreStatus::Connected, StatusCode::OK),
        Err(e) => {
            tracing::warn!(error = %e, "Redis health check failed");
            (StoreStatus::Disconnected, StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    (
        code,
        Json(StoreStatusResponse {
            status,
            mode: state.mode(),
            pool: Some(pool.status()),
        }),
    )
}

/// Persisted message log of a room, oldest first
///
/// GET /api/redis/room/:room/messages
pub async fn room_messages(
    State(state): State<GatewayState>,
    Path(path): Path<RoomPath>,
) -> ApiResult<Json<RoomMessagesResponse>> {
    let room = path.into_room()?;
    let messages = state.messages().recent(&room, MESSAGE_LOG_CAP).await?;

    Ok(Json(RoomMessagesResponse {
        room,
        count: messages.len(),
        messages,
    }))
}

/// Persisted participants of a room
///
/// GET /api/redis/room/:room/users
pub async fn room_users(
    State(state): State<GatewayState>,
    Path(path): Path<RoomPath>,
) -> ApiResult<Json<RoomUsersResponse>> {
    let room = path.into_room()?;
    let users = state.participants().room_participants(&room).await?;

    Ok(Json(RoomUsersResponse {
        room,
        count: users.len(),
        users,
    }))
}
