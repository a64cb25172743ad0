//! HTTP + WebSocket adapter for a remote bundle server.
//!
//! The server exposes `GET/PUT /bundle` for whole-record transfer, a
//! `GET /health` probe, and a `/changes` WebSocket whose every text frame
//! is a full bundle JSON.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use super::{BundleStore, StoreError};
use crate::models::Bundle;

/// Timeout for the reachability probe.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);
/// Buffered change notifications before the reader applies backpressure.
const CHANGE_BUFFER: usize = 16;

pub struct RemoteBundleStore {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteBundleStore {
    pub fn new(server_url: String, api_key: String) -> Self {
        Self {
            server_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn bundle_url(&self) -> String {
        format!("{}/bundle", http_base_url(&self.server_url))
    }

    fn changes_url(&self) -> String {
        format!(
            "{}/changes?key={}",
            ws_base_url(&self.server_url),
            self.api_key
        )
    }
}

#[async_trait]
impl BundleStore for RemoteBundleStore {
    async fn write(&self, bundle: &Bundle) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.bundle_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(bundle)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "Server returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn read_once(&self) -> Result<Option<Bundle>, StoreError> {
        let response = self
            .client
            .get(self.bundle_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "Server returned status {}",
                response.status()
            )));
        }

        let bundle = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(bundle))
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<Bundle>, StoreError> {
        let (ws_stream, _) = connect_async(self.changes_url())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let (mut sender, mut receiver) = ws_stream.split();
        let (tx, rx) = mpsc::channel(CHANGE_BUFFER);

        tokio::spawn(async move {
            while let Some(message) = receiver.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<Bundle>(&text) {
                        Ok(bundle) => {
                            if tx.send(bundle).await.is_err() {
                                // Receiver dropped: unsubscribe
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("ignoring malformed change frame: {}", e);
                        }
                    },
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("change subscription closed by server");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("change subscription failed: {}", e);
                        break;
                    }
                }
            }
            let _ = sender.send(Message::Close(None)).await;
        });

        Ok(rx)
    }
}

/// Probes the server's health endpoint for fast offline detection.
pub async fn check_server(server_url: &str) -> bool {
    let url = format!("{}/health", http_base_url(server_url));
    let client = match reqwest::Client::builder().timeout(HEALTH_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Normalizes a configured server URL to an http(s) base.
fn http_base_url(server_url: &str) -> String {
    let base = if server_url.starts_with("ws://") {
        server_url.replace("ws://", "http://")
    } else if server_url.starts_with("wss://") {
        server_url.replace("wss://", "https://")
    } else if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
        format!("http://{}", server_url)
    } else {
        server_url.to_string()
    };

    base.trim_end_matches('/').to_string()
}

/// Normalizes a configured server URL to a ws(s) base.
fn ws_base_url(server_url: &str) -> String {
    let base = if server_url.starts_with("http://") {
        server_url.replace("http://", "ws://")
    } else if server_url.starts_with("https://") {
        server_url.replace("https://", "wss://")
    } else if !server_url.starts_with("ws://") && !server_url.starts_with("wss://") {
        format!("ws://{}", server_url)
    } else {
        server_url.to_string()
    };

    base.trim_end_matches('/').to_string()
}
