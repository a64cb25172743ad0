//! In-process bundle store.
//!
//! Used by tests and as the stand-in when no sync server is configured,
//! so a player degrades to local-only operation behind the same interface.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{BundleStore, StoreError};
use crate::models::Bundle;

/// Buffered change notifications per subscriber.
const SUBSCRIBER_BUFFER: usize = 16;

#[derive(Default)]
pub struct MemoryBundleStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    bundle: Option<Bundle>,
    subscribers: Vec<mpsc::Sender<Bundle>>,
}

impl MemoryBundleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscribers, for tests.
    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .subscribers
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

#[async_trait]
impl BundleStore for MemoryBundleStore {
    async fn write(&self, bundle: &Bundle) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.bundle = Some(bundle.clone());

        // Fan out to live subscribers, dropping the ones that went away
        inner.subscribers.retain(|tx| !tx.is_closed());
        for tx in &inner.subscribers {
            let _ = tx.try_send(bundle.clone());
        }
        Ok(())
    }

    async fn read_once(&self) -> Result<Option<Bundle>, StoreError> {
        Ok(self.inner.lock().unwrap().bundle.clone())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<Bundle>, StoreError> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.inner.lock().unwrap().subscribers.push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_before_write_is_absent() {
        let store = MemoryBundleStore::new();
        assert!(store.read_once().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let store = MemoryBundleStore::new();

        let mut bundle = Bundle::default();
        bundle.config.language = "sv".to_string();
        bundle.touch();

        store.write(&bundle).await.unwrap();
        let read = store.read_once().await.unwrap().unwrap();
        assert_eq!(read, bundle);
    }

    #[tokio::test]
    async fn test_write_notifies_subscribers() {
        let store = MemoryBundleStore::new();
        let mut first = store.subscribe().await.unwrap();
        let mut second = store.subscribe().await.unwrap();

        let mut bundle = Bundle::default();
        bundle.touch();
        store.write(&bundle).await.unwrap();

        assert_eq!(first.recv().await.unwrap(), bundle);
        assert_eq!(second.recv().await.unwrap(), bundle);
    }

    #[tokio::test]
    async fn test_dropped_receiver_unsubscribes() {
        let store = MemoryBundleStore::new();
        let rx = store.subscribe().await.unwrap();
        drop(rx);

        let bundle = Bundle::default();
        store.write(&bundle).await.unwrap();
        assert_eq!(store.subscriber_count(), 0);
    }
}
