//! Gateway server setup
//!
//! Builds the state, routes and middleware, and serves until Ctrl+C.

mod handler;
mod state;

pub use handler::ws_handler;
pub use state::{GatewayState, StoreMode};

use crate::api;
use axum::{routing::get, Router};
use roomchat_cache::RedisPool;
use roomchat_common::{AppConfig, AppError};
use tokio::net::TcpListener;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .merge(api::routes())
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let cors = state.config().cors.clone();
    let is_production = state.config().app.env.is_production();

    api::apply_middleware(create_router(), &cors, is_production).with_state(state)
}

/// Connect to Redis, falling back to single-node mode when it is unreachable
pub async fn create_gateway_state(config: AppConfig) -> GatewayState {
    match connect_redis(&config).await {
        Some(pool) => {
            tracing::info!("Redis connection established, running with shared stores");
            GatewayState::with_redis(config, pool)
        }
        None => {
            tracing::warn!("Redis unavailable, running in single-node mode");
            GatewayState::in_memory(config)
        }
    }
}

async fn connect_redis(config: &AppConfig) -> Option<RedisPool> {
    tracing::info!("Connecting to Redis...");

    let pool = match RedisPool::from_config(&config.redis) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create Redis pool");
            return None;
        }
    };

    match pool.health_check().await {
        Ok(()) => Some(pool),
        Err(e) => {
            tracing::warn!(url = %pool.url(), error = %e, "Redis health check failed");
            None
        }
    }
}

/// Serve the application on an already bound listener until shutdown
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(anyhow::anyhow!("Server error: {e}")))
}

/// Run the gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.address();

    let listener = TcpListener::bind(&addr).await.map_err(|e| AppError::Bind {
        addr: addr.clone(),
        reason: e.to_string(),
    })?;

    let state = create_gateway_state(config).await;
    let app = create_app(state.clone());

    tracing::info!(mode = ?state.mode(), "Gateway listening on http://{}", addr);

    let result = serve(listener, app).await;
    state.shutdown();

    tracing::info!("Gateway stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
