//! Redis Pub/Sub subscriber.
//!
//! Holds one dedicated pub/sub connection per process. Room subscriptions are
//! tracked as a desired set, so a reconnect restores them all and callers
//! never wait on the connection.

use crate::pubsub::{PubSubChannel, PubSubEvent};
use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify, RwLock};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Received message from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Channel the message was received on
    pub channel: PubSubChannel,
    /// Parsed event (if valid JSON)
    pub event: Option<PubSubEvent>,
    /// Raw payload
    pub payload: String,
}

impl ReceivedMessage {
    /// Create from raw Redis message
    fn from_redis(channel_name: &str, payload: String) -> Self {
        let channel = PubSubChannel::parse(channel_name);
        let event = serde_json::from_str(&payload).ok();

        Self {
            channel,
            event,
            payload,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// State shared between the subscriber handle and its listener task
#[derive(Default)]
struct Shared {
    /// Channels this process wants to hear
    desired: RwLock<HashSet<String>>,
    /// Woken whenever `desired` changes or on shutdown
    changed: Notify,
    closed: AtomicBool,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// How a listener session ended
enum SessionEnd {
    Shutdown,
    Disconnected,
}

/// Redis Pub/Sub subscriber
///
/// `subscribe` and `unsubscribe` only record the desired channel set and wake
/// the listener, so they never wait on Redis. The listener applies the set
/// whenever it holds a connection.
pub struct Subscriber {
    shared: Arc<Shared>,
    /// Broadcast sender for messages
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
}

impl Subscriber {
    /// Create a new subscriber and start the background listener
    #[must_use]
    pub fn new(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let shared = Arc::new(Shared::default());

        tokio::spawn(Self::listener_loop(
            config,
            Arc::clone(&shared),
            broadcast_tx.clone(),
        ));

        Self {
            shared,
            broadcast_tx,
        }
    }

    /// Background listener loop
    async fn listener_loop(
        config: SubscriberConfig,
        shared: Arc<Shared>,
        broadcast_tx: broadcast::Sender<ReceivedMessage>,
    ) {
        let delay = Duration::from_millis(config.reconnect_delay_ms);

        while !shared.is_closed() {
            match Self::run_listener(&config, &shared, &broadcast_tx).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Disconnected) => {
                    tracing::warn!("Pub/Sub stream ended, reconnecting");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting");
                }
            }

            // Set changes while disconnected are picked up on the next session
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    () = &mut sleep => break,
                    () = shared.changed.notified() => {
                        if shared.is_closed() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Subscriber shutting down");
    }

    /// Run the listener until error or shutdown
    async fn run_listener(
        config: &SubscriberConfig,
        shared: &Shared,
        broadcast_tx: &broadcast::Sender<ReceivedMessage>,
    ) -> SubscriberResult<SessionEnd> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        // Channels subscribed on this connection
        let mut active = HashSet::new();
        Self::reconcile(&mut pubsub, shared, &mut active).await?;

        tracing::info!(channels = active.len(), "Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        return Ok(SessionEnd::Disconnected);
                    };

                    let channel_name = msg.get_channel_name().to_string();
                    let payload: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(
                                channel = %channel_name,
                                error = %e,
                                "Unreadable Pub/Sub payload"
                            );
                            continue;
                        }
                    };

                    tracing::trace!(channel = %channel_name, "Received Pub/Sub message");

                    // No receivers is fine
                    let _ = broadcast_tx.send(ReceivedMessage::from_redis(&channel_name, payload));
                }

                () = shared.changed.notified() => {
                    if shared.is_closed() {
                        return Ok(SessionEnd::Shutdown);
                    }
                    drop(stream);
                    Self::reconcile(&mut pubsub, shared, &mut active).await?;
                    stream = pubsub.on_message();
                }
            }
        }
    }

    /// Bring the connection's subscriptions in line with the desired set
    async fn reconcile(
        pubsub: &mut redis::aio::PubSub,
        shared: &Shared,
        active: &mut HashSet<String>,
    ) -> SubscriberResult<()> {
        let desired = shared.desired.read().await.clone();

        let added: Vec<String> = desired.difference(active).cloned().collect();
        let removed: Vec<String> = active.difference(&desired).cloned().collect();

        for channel in added {
            pubsub.subscribe(&channel).await?;
            tracing::debug!(channel = %channel, "Subscribed to channel");
            active.insert(channel);
        }

        for channel in removed {
            pubsub.unsubscribe(&channel).await?;
            tracing::debug!(channel = %channel, "Unsubscribed from channel");
            active.remove(&channel);
        }

        Ok(())
    }

    /// Subscribe to channels
    pub async fn subscribe(&self, channels: &[PubSubChannel]) {
        let mut desired = self.shared.desired.write().await;
        desired.extend(channels.iter().map(PubSubChannel::name));
        drop(desired);
        self.shared.changed.notify_one();
    }

    /// Unsubscribe from channels
    pub async fn unsubscribe(&self, channels: &[PubSubChannel]) {
        let mut desired = self.shared.desired.write().await;
        for channel in channels {
            desired.remove(&channel.name());
        }
        drop(desired);
        self.shared.changed.notify_one();
    }

    /// Get a receiver for broadcast messages
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Channels this process wants to hear, sorted
    pub async fn subscribed_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.shared.desired.read().await.iter().cloned().collect();
        channels.sort();
        channels
    }

    /// Stop the background listener
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.changed.notify_one();
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for subscriber
pub struct SubscriberBuilder {
    config: SubscriberConfig,
}

impl SubscriberBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SubscriberConfig::default(),
        }
    }

    /// Set Redis URL
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    /// Set broadcast buffer size
    #[must_use]
    pub fn broadcast_buffer(mut self, size: usize) -> Self {
        self.config.broadcast_buffer = size;
        self
    }

    /// Set reconnection delay
    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    /// Build and start the subscriber
    #[must_use]
    pub fn build(self) -> Subscriber {
        Subscriber::new(self.config)
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}
