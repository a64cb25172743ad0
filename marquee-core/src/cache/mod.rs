//! Local durable cache: last-known bundle plus uploaded media blobs.

mod blobs;
mod store;

pub use blobs::{BlobError, BlobStore};
pub use store::{CacheError, LocalCache};
