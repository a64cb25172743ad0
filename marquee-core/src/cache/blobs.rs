//! Large-object sub-store for uploaded media.
//!
//! Uploads live only on the device they were made on; a player on another
//! device resolves the same item to [`BlobError::NotFound`], which is a
//! terminal playback condition, not something to retry.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;

use thiserror::Error;

/// Copy granularity for uploads; large payloads stream through this buffer.
const CHUNK_SIZE: usize = 1024 * 1024;

/// Errors that can occur with blob storage.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("No blob stored under key '{0}' on this device")]
    NotFound(String),

    #[error("I/O error for {0}: {1}")]
    Io(PathBuf, io::Error),
}

/// File-per-key store for multi-gigabyte media payloads.
#[derive(Clone)]
pub struct BlobStore {
    blob_dir: PathBuf,
}

impl BlobStore {
    pub fn new(blob_dir: PathBuf) -> Self {
        Self { blob_dir }
    }

    pub fn blob_dir(&self) -> &PathBuf {
        &self.blob_dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.blob_dir.join(key)
    }

    /// Whether a blob exists under `key` on this device.
    pub fn contains(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    /// Streams `reader` into the store under `key`.
    ///
    /// `on_progress` is invoked after every chunk with (bytes written,
    /// total expected); `total` is whatever the caller knows up front and
    /// is not validated against the stream length.
    pub fn put_blob<R: Read>(
        &self,
        key: &str,
        mut reader: R,
        total: u64,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<(), BlobError> {
        fs::create_dir_all(&self.blob_dir)
            .map_err(|e| BlobError::Io(self.blob_dir.clone(), e))?;

        let path = self.path(key);
        let mut file = File::create(&path).map_err(|e| BlobError::Io(path.clone(), e))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut written: u64 = 0;
        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| BlobError::Io(path.clone(), e))?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])
                .map_err(|e| BlobError::Io(path.clone(), e))?;
            written += read as u64;
            on_progress(written, total);
        }

        Ok(())
    }

    /// Returns a `file://` URL for the blob, or `None` if it is not on
    /// this device.
    pub fn get_blob_url(&self, key: &str) -> Option<String> {
        let path = self.path(key);
        if path.is_file() {
            Some(format!("file://{}", path.display()))
        } else {
            None
        }
    }

    /// Removes a blob. Returns `NotFound` if it was never stored here.
    pub fn delete_blob(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(BlobError::Io(path, e)),
        }
    }
}
