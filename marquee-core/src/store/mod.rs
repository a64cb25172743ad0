//! Remote bundle store: the single inter-process shared resource.
//!
//! The whole bundle is the unit of transfer; partial fields are never
//! sent. There is no sub-document locking, so whole-record replacement is
//! the chosen granularity.

mod memory;
mod remote;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::Bundle;

pub use memory::MemoryBundleStore;
pub use remote::{check_server, RemoteBundleStore};

/// A replicated record store supporting read-once, write-whole-record,
/// and subscribe-for-changes.
#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Replaces the stored bundle.
    async fn write(&self, bundle: &Bundle) -> Result<(), StoreError>;

    /// Reads the current bundle, `None` if nothing was ever written.
    async fn read_once(&self) -> Result<Option<Bundle>, StoreError>;

    /// Streams change notifications; each message is the full new bundle.
    /// Dropping the receiver unsubscribes.
    async fn subscribe(&self) -> Result<mpsc::Receiver<Bundle>, StoreError>;
}

/// Errors that can occur talking to the bundle store.
#[derive(Debug)]
pub enum StoreError {
    /// No store endpoint configured
    NotConfigured,
    /// HTTP request failed or returned a non-success status
    Http(String),
    /// Failed to establish the change subscription
    Connection(String),
    /// WebSocket error on an established subscription
    WebSocket(String),
    /// Payload was not a valid bundle
    Decode(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotConfigured => {
                write!(f, "Bundle store not configured. Add sync_url to config.")
            }
            StoreError::Http(e) => write!(f, "HTTP error: {}", e),
            StoreError::Connection(e) => write!(f, "Connection error: {}", e),
            StoreError::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            StoreError::Decode(e) => write!(f, "Invalid bundle payload: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}
