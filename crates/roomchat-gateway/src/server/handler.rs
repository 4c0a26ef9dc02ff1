//! WebSocket handler
//!
//! One receive loop per connection applies inbound events in order; a send
//! task drains the connection's outbound queue into the socket.

use crate::connection::{Connection, EventRateLimiter};
use crate::protocol::{ClientEvent, ProtocolError, ServerFrame};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel buffer size for outgoing frames
const MESSAGE_BUFFER_SIZE: usize = 100;

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn ws_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let connection_id = uuid::Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::channel::<ServerFrame>(MESSAGE_BUFFER_SIZE);
    let limiter = EventRateLimiter::from_config(&state.config().rate_limit);
    let connection = state
        .connection_manager()
        .add_connection(connection_id.clone(), tx, limiter);

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    let state_recv = state.clone();
    let connection_recv = Arc::clone(&connection);

    let mut recv_task = tokio::spawn(async move {
        let connection_id = connection_recv.id();
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    handle_text_message(&state_recv, &connection_recv, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    reject_frame(&connection_recv, &ProtocolError::BinaryFrame);
                }
                Ok(Message::Ping(_)) => {
                    tracing::trace!(connection_id = %connection_id, "Ping received");
                }
                Ok(Message::Pong(_)) => {
                    tracing::trace!(connection_id = %connection_id, "Pong received");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %connection_id, "Client closed connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    let connection_id_send = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let json = match frame.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(event = %frame.event, error = %e, "Failed to encode frame");
                    continue;
                }
            };

            if ws_sink.send(Message::Text(json.into())).await.is_err() {
                tracing::debug!(
                    connection_id = %connection_id_send,
                    "Failed to send frame to WebSocket"
                );
                break;
            }
        }

        let _ = ws_sink.close().await;
    });

    tokio::select! {
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
            send_task.abort();
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            recv_task.abort();
        }
    }

    cleanup_connection(&state, &connection_id).await;
}

/// Decode a text frame and hand it to the event router
async fn handle_text_message(state: &GatewayState, connection: &Connection, text: &str) {
    let event = match ClientEvent::from_json(text) {
        Ok(event) => event,
        Err(e) => {
            reject_frame(connection, &e);
            return;
        }
    };

    tracing::trace!(
        connection_id = %connection.id(),
        event = %event.event_type(),
        "Received event"
    );

    if let Err(e) = state.router().handle(connection, event).await {
        if let Some(frame) = e.client_frame() {
            if connection.deliver(frame).is_err() {
                tracing::debug!(connection_id = %connection.id(), "Could not deliver error frame");
            }
        }

        if e.is_client_error() {
            tracing::debug!(connection_id = %connection.id(), error = %e, "Event dropped");
        } else {
            tracing::warn!(connection_id = %connection.id(), error = %e, "Event failed");
        }
    }
}

/// Answer an undecodable frame with an `error` event
fn reject_frame(connection: &Connection, error: &ProtocolError) {
    tracing::debug!(
        connection_id = %connection.id(),
        error = %error,
        "Rejected frame"
    );

    let frame = ServerFrame::error(error.code(), error.to_string());
    if connection.deliver(frame).is_err() {
        tracing::debug!(connection_id = %connection.id(), "Could not deliver error frame");
    }
}

/// Clean up a connection on disconnect
async fn cleanup_connection(state: &GatewayState, connection_id: &str) {
    tracing::info!(connection_id = %connection_id, "Cleaning up connection");

    state.router().disconnect(connection_id).await;
}
