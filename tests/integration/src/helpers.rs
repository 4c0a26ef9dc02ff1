//! Test helpers for integration tests
//!
//! Spawns servers on ephemeral ports and drives them over HTTP and WebSocket.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use roomchat_cache::RedisPool;
use roomchat_common::AppConfig;
use roomchat_gateway::{create_app, GatewayState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::fixtures::{join_frame, message_frame, typing_frame, Frame};

/// How long to wait for an expected frame
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a single-node server with in-memory stores
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config(&[])?).await
    }

    /// Start a single-node server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        Self::start_with_state(GatewayState::in_memory(config)).await
    }

    /// Start a server sharing the Redis at `REDIS_URL`, if one is reachable
    pub async fn start_with_redis() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("REDIS_URL") else {
            return Ok(None);
        };

        let config = test_config(&[("REDIS_URL", url.as_str())])?;
        let pool = RedisPool::from_config(&config.redis)?;
        if pool.health_check().await.is_err() {
            return Ok(None);
        }

        Self::start_with_state(GatewayState::with_redis(config, pool))
            .await
            .map(Some)
    }

    async fn start_with_state(state: GatewayState) -> Result<Self> {
        let app = create_app(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Open a WebSocket connection
    pub async fn connect(&self) -> Result<WsClient> {
        let url = format!("ws://{}/ws", self.addr);
        let (stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("connecting to {url}"))?;
        Ok(WsClient { stream })
    }

    /// Open a connection and join `room`, consuming the join replies
    pub async fn join(&self, username: &str, room: &str) -> Result<WsClient> {
        let mut client = self.connect().await?;
        client.join(username, room).await?;
        client.expect("room-joined").await?;
        client.expect("chat-history").await?;
        Ok(client)
    }
}

/// WebSocket client speaking the `{event, data}` frame protocol
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send a raw JSON frame
    pub async fn send_json(&mut self, frame: &Value) -> Result<()> {
        self.stream.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Send a raw text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    pub async fn join(&mut self, username: &str, room: &str) -> Result<()> {
        self.send_json(&join_frame(username, room)).await
    }

    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.send_json(&message_frame(text)).await
    }

    pub async fn typing(&mut self, is_typing: bool) -> Result<()> {
        self.send_json(&typing_frame(is_typing)).await
    }

    /// Next frame from the server, failing after a timeout
    pub async fn next_frame(&mut self) -> Result<Frame> {
        tokio::time::timeout(FRAME_TIMEOUT, self.read_frame())
            .await
            .context("timed out waiting for a frame")?
    }

    /// Skip frames until one with the given event arrives
    pub async fn expect(&mut self, event: &str) -> Result<Frame> {
        tokio::time::timeout(FRAME_TIMEOUT, async {
            loop {
                let frame = self.read_frame().await?;
                if frame.event == event {
                    return Ok::<_, anyhow::Error>(frame);
                }
            }
        })
        .await
        .with_context(|| format!("timed out waiting for {event}"))?
    }

    /// Collect every frame that arrives within `window`
    pub async fn drain(&mut self, window: Duration) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(Ok(frame)) = tokio::time::timeout(window, self.read_frame()).await {
            frames.push(frame);
        }
        frames
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            let message = self
                .stream
                .next()
                .await
                .context("connection closed")??;

            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => anyhow::bail!("connection closed"),
                _ => {}
            }
        }
    }
}

/// Create a test configuration from explicit variables only
pub fn test_config(vars: &[(&str, &str)]) -> Result<AppConfig> {
    AppConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    })
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
