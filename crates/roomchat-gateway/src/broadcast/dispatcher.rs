//! Event dispatcher
//!
//! Receives room events other processes published to Redis and delivers them
//! to this process's members of the room.

use crate::connection::ConnectionManager;
use crate::protocol::{EventType, ServerFrame};
use roomchat_cache::{PubSubChannel, ReceivedMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Routes Redis Pub/Sub messages to local WebSocket connections
pub struct EventDispatcher {
    /// This process's node id; envelopes carrying it were already delivered
    node_id: String,
    /// Connection manager for sending frames
    connection_manager: Arc<ConnectionManager>,
    /// Whether the dispatcher is running
    running: AtomicBool,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    #[must_use]
    pub fn new(node_id: impl Into<String>, connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            node_id: node_id.into(),
            connection_manager,
            running: AtomicBool::new(false),
        }
    }

    /// Start the event dispatcher
    ///
    /// Spawns a background task that drains `receiver` until it closes or
    /// [`EventDispatcher::stop`] is called.
    pub fn start(self: Arc<Self>, receiver: broadcast::Receiver<ReceivedMessage>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event dispatcher is already running");
            return;
        }

        tokio::spawn(async move {
            self.run(receiver).await;
        });

        tracing::info!("Event dispatcher started");
    }

    /// Stop the event dispatcher after the next message
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Event dispatcher stopped");
    }

    /// Run the event dispatcher loop
    async fn run(&self, mut receiver: broadcast::Receiver<ReceivedMessage>) {
        while self.running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(msg) => {
                    self.dispatch(&msg);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Event dispatcher lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Event dispatcher channel closed");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Event dispatcher loop ended");
    }

    /// Deliver one received message, returning the number of local connections reached
    pub fn dispatch(&self, msg: &ReceivedMessage) -> usize {
        let Some(event) = &msg.event else {
            tracing::debug!(channel = %msg.channel, "Received non-event message, ignoring");
            return 0;
        };

        if event.is_from(&self.node_id) {
            tracing::trace!(channel = %msg.channel, "Skipping own event");
            return 0;
        }

        let PubSubChannel::Room(room) = &msg.channel else {
            tracing::debug!(
                channel = %msg.channel,
                event_type = %event.event_type,
                "Received event on custom channel, ignoring"
            );
            return 0;
        };

        let Ok(event_type) = event.event_type.parse::<EventType>() else {
            tracing::debug!(event_type = %event.event_type, "Unknown event type, ignoring");
            return 0;
        };

        let frame = ServerFrame::new(event_type, event.data.clone());
        let sent = self
            .connection_manager
            .send_to_room(room, &frame, event.excluded());

        tracing::trace!(
            room = %room,
            event_type = %event_type,
            origin = ?event.origin,
            sent = sent,
            "Event dispatched to room"
        );

        sent
    }

    /// Check if the dispatcher is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::EventRateLimiter;
    use roomchat_cache::{EventTarget, PubSubEvent};
    use tokio::sync::mpsc;

    fn received(channel: PubSubChannel, event: PubSubEvent) -> ReceivedMessage {
        ReceivedMessage {
            channel,
            payload: event.to_json().unwrap(),
            event: Some(event),
        }
    }

    fn setup() -> (
        EventDispatcher,
        mpsc::Receiver<ServerFrame>,
        mpsc::Receiver<ServerFrame>,
    ) {
        let manager = ConnectionManager::new_shared();
        let (tx1, rx1) = mpsc::channel(10);
        let (tx2, rx2) = mpsc::channel(10);
        manager.add_connection("c1".to_string(), tx1, EventRateLimiter::default());
        manager.add_connection("c2".to_string(), tx2, EventRateLimiter::default());
        manager.enter_room("c1", "general");
        manager.enter_room("c2", "general");
        (EventDispatcher::new("node-a", manager), rx1, rx2)
    }

    #[tokio::test]
    async fn test_remote_event_reaches_room_minus_excluded() {
        let (dispatcher, mut rx1, mut rx2) = setup();

        let data = serde_json::json!({"username": "zed", "isTyping": true});
        let event = PubSubEvent::new("user-typing", data)
            .with_origin("node-b")
            .with_target(EventTarget::room("general").exclude_connection("c2"));

        let sent = dispatcher.dispatch(&received(PubSubChannel::room("general"), event));
        assert_eq!(sent, 1);

        let frame = rx1.recv().await.unwrap();
        assert_eq!(frame.event, EventType::UserTyping);
        assert_eq!(frame.data["username"], "zed");
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_own_events_are_ignored() {
        let (dispatcher, mut rx1, _rx2) = setup();

        let event = PubSubEvent::new("new-message", serde_json::json!({"message": "hi"}))
            .with_origin("node-a");
        assert_eq!(dispatcher.dispatch(&received(PubSubChannel::room("general"), event)), 0);
        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn test_unroutable_messages_are_ignored() {
        let (dispatcher, _rx1, _rx2) = setup();

        let unknown = PubSubEvent::new("guild-create", serde_json::json!({})).with_origin("node-b");
        assert_eq!(dispatcher.dispatch(&received(PubSubChannel::room("general"), unknown)), 0);

        let custom = PubSubEvent::new("new-message", serde_json::json!({})).with_origin("node-b");
        assert_eq!(dispatcher.dispatch(&received(PubSubChannel::custom("ops"), custom)), 0);

        let garbage = ReceivedMessage {
            channel: PubSubChannel::room("general"),
            event: None,
            payload: "garbage".to_string(),
        };
        assert_eq!(dispatcher.dispatch(&garbage), 0);
    }

    #[tokio::test]
    async fn test_start_drains_receiver() {
        let (dispatcher, mut rx1, _rx2) = setup();
        let dispatcher = Arc::new(dispatcher);
        let (tx, rx) = broadcast::channel(8);

        Arc::clone(&dispatcher).start(rx);
        assert!(dispatcher.is_running());

        let event = PubSubEvent::new("user-left", serde_json::json!({"username": "zed"}))
            .with_origin("node-b");
        tx.send(received(PubSubChannel::room("general"), event)).unwrap();

        let frame = rx1.recv().await.unwrap();
        assert_eq!(frame.event, EventType::UserLeft);
    }
}
