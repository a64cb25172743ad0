//! Shared authoring path for one-shot commands.
//!
//! Every authoring command follows the same shape: load the newest bundle
//! (cached or remote), mutate it, stamp it, persist it locally, and
//! replicate best-effort. Replication failure leaves the change
//! local-only; other clients pick it up after the next successful push.

use marquee_core::{check_server, Bundle, BundleStore, CacheError, LocalCache, RemoteBundleStore};

use crate::config::Config;

pub struct Workspace {
    cache: LocalCache,
    store: Option<RemoteBundleStore>,
}

impl Workspace {
    pub fn from_config(config: &Config) -> Self {
        let cache = LocalCache::new(config.data_dir.value.clone());
        let store = match (&config.sync.server_url, &config.sync.api_key) {
            (Some(url), Some(key)) => Some(RemoteBundleStore::new(url.clone(), key.clone())),
            _ => None,
        };
        Self { cache, store }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn store(&self) -> Option<&RemoteBundleStore> {
        self.store.as_ref()
    }

    /// Loads the newest of the cached and remote bundles.
    ///
    /// An unreachable remote silently resolves to the cached copy; a
    /// command editing slightly stale data is corrected by last-writer-wins
    /// once connectivity returns.
    pub async fn load_newest(&self) -> Result<Bundle, CacheError> {
        let cached = self.cache.load_bundle()?;
        let remote = match &self.store {
            Some(store) => store.read_once().await.unwrap_or(None),
            None => None,
        };
        Ok(Bundle::newest(cached, remote))
    }

    /// Stamps the bundle, persists it locally, and replicates best-effort.
    pub async fn commit(&self, bundle: &mut Bundle) -> Result<(), CacheError> {
        bundle.touch();
        self.cache.save_bundle(bundle)?;

        if let Some(store) = &self.store {
            if !check_server(store.server_url()).await {
                eprintln!("Sync: server unreachable (change saved locally)");
                return Ok(());
            }
            if let Err(e) = store.write(bundle).await {
                eprintln!("Sync: {} (change saved locally)", e);
            }
        }
        Ok(())
    }
}
