//! Event router
//!
//! Per-connection state machine: `Unjoined -> Joined(room)` on join, a second
//! join moves the connection to the new room, and disconnect ends it.

use super::{HandlerError, HandlerResult};
use crate::broadcast::Broadcaster;
use crate::connection::Connection;
use crate::presence::PresenceTracker;
use crate::protocol::{
    validation_message, ClientEvent, JoinRoomPayload, SendMessagePayload, ServerFrame,
};
use roomchat_core::{
    ChatMessage, MessageIdGenerator, MessageLog, Participant, ParticipantStore,
    HISTORY_REPLAY_LIMIT,
};
use std::sync::Arc;

/// Applies client events to presence, the stores and the broadcaster
pub struct EventRouter {
    presence: Arc<PresenceTracker>,
    participants: Arc<dyn ParticipantStore>,
    messages: Arc<dyn MessageLog>,
    broadcaster: Arc<Broadcaster>,
    ids: Arc<MessageIdGenerator>,
}

impl EventRouter {
    #[must_use]
    pub fn new(
        presence: Arc<PresenceTracker>,
        participants: Arc<dyn ParticipantStore>,
        messages: Arc<dyn MessageLog>,
        broadcaster: Arc<Broadcaster>,
        ids: Arc<MessageIdGenerator>,
    ) -> Self {
        Self {
            presence,
            participants,
            messages,
            broadcaster,
            ids,
        }
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Handle one decoded client event
    pub async fn handle(&self, connection: &Connection, event: ClientEvent) -> HandlerResult<()> {
        if event.event_type().is_rate_limited() && !connection.allow_event() {
            return Err(HandlerError::RateLimited);
        }

        match event {
            ClientEvent::JoinRoom(payload) => self.join(connection.id(), payload).await,
            ClientEvent::SendMessage(payload) => self.send_message(connection.id(), payload).await,
            ClientEvent::TypingStart => self.typing(connection.id(), true).await,
            ClientEvent::TypingStop => self.typing(connection.id(), false).await,
        }
    }

    /// Join a room, leaving the current one first
    pub async fn join(&self, connection_id: &str, payload: JoinRoomPayload) -> HandlerResult<()> {
        let JoinRoomPayload { username, room } = payload
            .into_validated()
            .map_err(|e| HandlerError::InvalidJoin(validation_message(&e)))?;

        let participant = Participant::new(connection_id, &username, &room);
        if let Some(previous) = self.presence.set_active(connection_id, participant.clone()) {
            self.leave(&previous).await;
        }

        if let Err(e) = self.participants.save(&participant).await {
            tracing::error!(
                connection_id = %connection_id,
                room = %room,
                error = %e,
                "Failed to persist participant"
            );
        }

        self.broadcaster.enter_room(connection_id, &room).await;
        self.broadcaster
            .to_room(&room, ServerFrame::user_joined(&username, &room), Some(connection_id))
            .await;
        self.broadcaster
            .to_connection(connection_id, ServerFrame::room_joined(&room, &username));
        self.broadcast_room_users(&room).await;

        tracing::info!(
            connection_id = %connection_id,
            username = %username,
            room = %room,
            "Connection joined room"
        );

        self.replay_history(connection_id, &room);
        Ok(())
    }

    /// Post a message to the connection's room
    pub async fn send_message(
        &self,
        connection_id: &str,
        payload: SendMessagePayload,
    ) -> HandlerResult<()> {
        let participant = self.presence.get(connection_id).ok_or(HandlerError::NotJoined)?;

        let SendMessagePayload { message: body } = payload
            .into_validated()
            .map_err(|e| HandlerError::InvalidMessage(validation_message(&e)))?;

        let message = ChatMessage::new(
            self.ids.generate(),
            participant.username,
            participant.room,
            body,
        );
        self.messages.append(&message).await?;

        tracing::debug!(
            message_id = %message.id,
            room = %message.room,
            preview = %message.preview(40),
            "Message posted"
        );

        self.broadcaster
            .to_room(&message.room, ServerFrame::new_message(&message), None)
            .await;
        Ok(())
    }

    /// Tell the rest of the room the connection started or stopped typing
    pub async fn typing(&self, connection_id: &str, is_typing: bool) -> HandlerResult<()> {
        let participant = self.presence.get(connection_id).ok_or(HandlerError::NotJoined)?;

        self.broadcaster
            .to_room(
                &participant.room,
                ServerFrame::user_typing(&participant.username, is_typing),
                Some(connection_id),
            )
            .await;
        Ok(())
    }

    /// Terminal transition for a connection. Safe to call more than once.
    pub async fn disconnect(&self, connection_id: &str) {
        if let Some(participant) = self.presence.clear(connection_id) {
            self.leave(&participant).await;
            tracing::info!(
                connection_id = %connection_id,
                username = %participant.username,
                room = %participant.room,
                "Participant disconnected"
            );
        }

        self.broadcaster.forget_connection(connection_id).await;
    }

    /// Broadcast the current member list of a room to the whole room
    ///
    /// The shared store lists members on every process. Local members are
    /// merged in so a failed write never hides a connection from its room.
    pub async fn broadcast_room_users(&self, room: &str) {
        let mut participants = match self.participants.room_participants(room).await {
            Ok(participants) => participants,
            Err(e) => {
                tracing::warn!(
                    room = %room,
                    error = %e,
                    "Failed to read room participants, using local view"
                );
                Vec::new()
            }
        };

        for local in self.presence.room_participants(room) {
            if !participants.iter().any(|p| p.id == local.id) {
                participants.push(local);
            }
        }
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));

        let users: Vec<_> = participants.iter().map(Participant::summary).collect();
        self.broadcaster
            .to_room(room, ServerFrame::room_users(&users), None)
            .await;
    }

    /// Drop a membership from the store and routing, then notify the room
    async fn leave(&self, participant: &Participant) {
        if let Err(e) = self.participants.remove(participant).await {
            tracing::error!(
                connection_id = %participant.id,
                room = %participant.room,
                error = %e,
                "Failed to remove participant"
            );
        }

        self.broadcaster
            .leave_room(&participant.id, &participant.room)
            .await;
        self.broadcaster
            .to_room(
                &participant.room,
                ServerFrame::user_left(&participant.username, &participant.room),
                None,
            )
            .await;
        self.broadcast_room_users(&participant.room).await;
    }

    fn replay_history(&self, connection_id: &str, room: &str) {
        let messages = Arc::clone(&self.messages);
        let broadcaster = Arc::clone(&self.broadcaster);
        let connection_id = connection_id.to_string();
        let room = room.to_string();

        tokio::spawn(async move {
            match messages.recent(&room, HISTORY_REPLAY_LIMIT).await {
                Ok(history) => {
                    broadcaster.to_connection(&connection_id, ServerFrame::chat_history(&history));
                }
                Err(e) => {
                    tracing::error!(room = %room, error = %e, "Failed to load chat history");
                }
            }
        });
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("presence", &self.presence)
            .field("broadcaster", &self.broadcaster)
            .finish_non_exhaustive()
    }
}
