//! The headless viewer loop.
//!
//! Builds the cache and store adapters, runs the sync engine, and prints
//! every screen transition as a console renderer until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::{
    BundleStore, EngineOptions, LocalCache, MediaSource, MemoryBundleStore, RemoteBundleStore,
    ScreenContent, SyncEngine,
};

use crate::config::Config;

/// Run the player
#[derive(Args)]
pub struct PlayCommand {
    /// Seconds between re-derivation ticks
    #[arg(long, default_value_t = 45)]
    poll_interval: u64,

    /// Replicate current-item changes from this instance
    #[arg(long)]
    authoring: bool,
}

impl PlayCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "marquee_core=info".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.play(config))
    }

    async fn play(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let cache = LocalCache::new(config.data_dir.value.clone());

        let store: Arc<dyn BundleStore> = match (&config.sync.server_url, &config.sync.api_key) {
            (Some(url), Some(key)) => {
                println!("Syncing with {}", url);
                Arc::new(RemoteBundleStore::new(url.clone(), key.clone()))
            }
            _ => {
                println!("No sync server configured; running local-only.");
                Arc::new(MemoryBundleStore::new())
            }
        };

        let options = EngineOptions {
            poll_interval: Duration::from_secs(self.poll_interval.max(1)),
            authoring: self.authoring,
        };
        let (engine, _handle, mut screen) = SyncEngine::new(cache, store, options);
        let engine_task = tokio::spawn(engine.run());

        present(&screen.borrow_and_update());
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = screen.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let content = screen.borrow_and_update().clone();
                    present(&content);
                }
            }
        }

        engine_task.abort();
        println!();
        println!("Stopped.");
        Ok(())
    }
}

/// Console renderer: one line per screen transition.
fn present(content: &ScreenContent) {
    match content {
        ScreenContent::Idle => println!("[idle]  nothing to play"),
        ScreenContent::Playing { item, media } => match media {
            MediaSource::File { url } => println!("[play]  {}  <- {}", item.title, url),
            MediaSource::Frame { url } => println!("[embed] {}  <- {}", item.title, url),
        },
        ScreenContent::Unavailable { item } => println!(
            "[unavailable]  {}  (media was uploaded on another device)",
            item.title
        ),
    }
}
