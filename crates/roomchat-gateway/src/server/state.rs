//! Gateway state
//!
//! Shared dependencies for the WebSocket and HTTP handlers.

use crate::broadcast::{Broadcaster, EventDispatcher};
use crate::connection::ConnectionManager;
use crate::handlers::EventRouter;
use crate::presence::PresenceTracker;
use roomchat_cache::{
    MemoryMessageLog, MemoryParticipantStore, Publisher, RedisMessageLog, RedisParticipantStore,
    RedisPool, SubscriberBuilder,
};
use roomchat_common::AppConfig;
use roomchat_core::{MessageIdGenerator, MessageLog, ParticipantStore};
use serde::Serialize;
use std::sync::Arc;

/// Which backend holds participants and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreMode {
    /// Redis stores with cross-process fan-out
    Redis,
    /// In-memory stores, local delivery only
    SingleNode,
}

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    router: Arc<EventRouter>,
    connection_manager: Arc<ConnectionManager>,
    presence: Arc<PresenceTracker>,
    participants: Arc<dyn ParticipantStore>,
    messages: Arc<dyn MessageLog>,
    redis: Option<RedisPool>,
    dispatcher: Option<Arc<EventDispatcher>>,
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// State for single-node mode
    #[must_use]
    pub fn in_memory(config: AppConfig) -> Self {
        let connection_manager = ConnectionManager::new_shared();
        let broadcaster = Broadcaster::local(node_id(), Arc::clone(&connection_manager));

        Self::assemble(
            config,
            connection_manager,
            broadcaster,
            Arc::new(MemoryParticipantStore::new()),
            Arc::new(MemoryMessageLog::new()),
            None,
            None,
        )
    }

    /// State backed by Redis stores and Pub/Sub fan-out
    ///
    /// Starts the subscriber and the dispatcher that feeds remote events to
    /// local connections.
    #[must_use]
    pub fn with_redis(config: AppConfig, pool: RedisPool) -> Self {
        let node_id = node_id();
        let connection_manager = ConnectionManager::new_shared();

        let subscriber = Arc::new(
            SubscriberBuilder::new()
                .redis_url(config.redis.url.clone())
                .build(),
        );
        let dispatcher = Arc::new(EventDispatcher::new(
            node_id.clone(),
            Arc::clone(&connection_manager),
        ));
        Arc::clone(&dispatcher).start(subscriber.receiver());

        let broadcaster = Broadcaster::distributed(
            node_id,
            Arc::clone(&connection_manager),
            Publisher::new(pool.clone()),
            subscriber,
        );

        Self::assemble(
            config,
            connection_manager,
            broadcaster,
            Arc::new(RedisParticipantStore::new(pool.clone())),
            Arc::new(RedisMessageLog::new(pool.clone())),
            Some(pool),
            Some(dispatcher),
        )
    }

    fn assemble(
        config: AppConfig,
        connection_manager: Arc<ConnectionManager>,
        broadcaster: Broadcaster,
        participants: Arc<dyn ParticipantStore>,
        messages: Arc<dyn MessageLog>,
        redis: Option<RedisPool>,
        dispatcher: Option<Arc<EventDispatcher>>,
    ) -> Self {
        let presence = Arc::new(PresenceTracker::new());
        let router = EventRouter::new(
            Arc::clone(&presence),
            Arc::clone(&participants),
            Arc::clone(&messages),
            Arc::new(broadcaster),
            Arc::new(MessageIdGenerator::new(config.worker.worker_id)),
        );

        Self {
            router: Arc::new(router),
            connection_manager,
            presence,
            participants,
            messages,
            redis,
            dispatcher,
            config: Arc::new(config),
        }
    }

    /// Get the event router
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn participants(&self) -> &dyn ParticipantStore {
        self.participants.as_ref()
    }

    pub fn messages(&self) -> &dyn MessageLog {
        self.messages.as_ref()
    }

    /// Redis pool, absent in single-node mode
    pub fn redis(&self) -> Option<&RedisPool> {
        self.redis.as_ref()
    }

    pub fn mode(&self) -> StoreMode {
        if self.redis.is_some() {
            StoreMode::Redis
        } else {
            StoreMode::SingleNode
        }
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Stop consuming remote events
    pub fn shutdown(&self) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.stop();
        }
    }
}

/// Id stamped on this process's published events
fn node_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("mode", &self.mode())
            .field("config", &"AppConfig")
            .finish()
    }
}
