//! Marquee Core Library
//!
//! Shared types and logic for Marquee players: the replicated bundle
//! model, the active-content and source resolvers, the per-device cache,
//! bundle store adapters, and the sync engine that ties them together.

pub mod cache;
pub mod catalog;
pub mod engine;
pub mod models;
pub mod resolve;
pub mod store;

pub use cache::{BlobError, BlobStore, CacheError, LocalCache};
pub use catalog::{CatalogClient, CatalogError, CatalogKind, CatalogResult, ExternalIds};
pub use engine::{
    EngineHandle, EngineOptions, EngineState, MediaSource, ScreenContent, SyncEngine, Trigger,
};
pub use models::{day_name, Bundle, ContentItem, ContentKind, PlayerConfig, PlayerMode, ScheduleRule};
pub use resolve::RenderInstruction;
pub use store::{check_server, BundleStore, MemoryBundleStore, RemoteBundleStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
