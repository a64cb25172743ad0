//! Durable per-device cache for the last-known bundle.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::warn;

use super::blobs::BlobStore;
use crate::models::Bundle;

/// Cache key the bundle is stored under.
const BUNDLE_KEY: &str = "bundle";

/// Per-device key/value store backed by one file per key.
///
/// Holds the last-known bundle so a player keeps working when the remote
/// store is unreachable. Survives restarts; values are plain strings.
#[derive(Clone)]
pub struct LocalCache {
    data_dir: PathBuf,
}

impl LocalCache {
    /// Creates a cache rooted at the given data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// The blob sub-store for uploaded media on this device.
    pub fn blobs(&self) -> BlobStore {
        BlobStore::new(self.data_dir.join("blobs"))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Reads a value.
    ///
    /// Returns `Ok(None)` if the key was never written.
    pub fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(path, e)),
        }
    }

    /// Writes a value, creating the data directory if needed.
    pub fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| CacheError::Io(self.data_dir.clone(), e))?;

        let path = self.path(key);
        fs::write(&path, value).map_err(|e| CacheError::Io(path, e))
    }

    /// Loads the cached bundle.
    ///
    /// A corrupt cached value reads as absent: the caller falls back to the
    /// remote store or the empty default, and the next save overwrites it.
    pub fn load_bundle(&self) -> Result<Option<Bundle>, CacheError> {
        match self.get(BUNDLE_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(bundle) => Ok(Some(bundle)),
                Err(e) => {
                    warn!("discarding corrupt cached bundle: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Persists the bundle as the last-known copy on this device.
    pub fn save_bundle(&self, bundle: &Bundle) -> Result<(), CacheError> {
        let json = serde_json::to_string(bundle).map_err(|e| CacheError::Encode(e.to_string()))?;
        self.set(BUNDLE_KEY, &json)
    }
}

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    /// I/O error reading or writing a cache file.
    Io(PathBuf, io::Error),
    /// Failed to serialize a value for caching.
    Encode(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Io(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            CacheError::Encode(e) => write!(f, "Failed to encode cached value: {}", e),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(_, e) => Some(e),
            CacheError::Encode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache() -> (LocalCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::new(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    #[test]
    fn test_get_missing_key_returns_none() {
        let (cache, _temp) = test_cache();
        assert!(cache.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        let (cache, _temp) = test_cache();
        cache.set("greeting", "hello").unwrap();
        assert_eq!(cache.get("greeting").unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_set_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let cache = LocalCache::new(nested.clone());

        cache.set("key", "value").unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_overwrite_existing_value() {
        let (cache, _temp) = test_cache();
        cache.set("key", "one").unwrap();
        cache.set("key", "two").unwrap();
        assert_eq!(cache.get("key").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_load_bundle_missing_returns_none() {
        let (cache, _temp) = test_cache();
        assert!(cache.load_bundle().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_bundle_roundtrip() {
        let (cache, _temp) = test_cache();

        let mut bundle = Bundle::default();
        bundle.config.language = "fr".to_string();
        bundle.touch();

        cache.save_bundle(&bundle).unwrap();
        let loaded = cache.load_bundle().unwrap().unwrap();
        assert_eq!(loaded, bundle);
    }

    #[test]
    fn test_corrupt_bundle_reads_as_absent() {
        let (cache, _temp) = test_cache();
        cache.set("bundle", "{not valid json").unwrap();
        assert!(cache.load_bundle().unwrap().is_none());
    }

    #[test]
    fn test_blobs_sub_store_lives_under_data_dir() {
        let (cache, temp) = test_cache();
        let blobs = cache.blobs();
        assert!(blobs.blob_dir().starts_with(temp.path()));
    }
}
