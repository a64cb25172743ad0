//! Sync CLI commands for reconciling with the remote bundle store.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use marquee_core::{check_server, Bundle, BundleStore};

use crate::authoring::Workspace;
use crate::config::Config;

/// Sync with the remote bundle store
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;

        match &self.command {
            None => rt.block_on(self.sync(config)),
            Some(SyncSubcommand::Status) => rt.block_on(self.status(config)),
        }
    }

    async fn sync(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        if !config.sync.is_configured() {
            return Err("Sync not configured. Add sync.server_url and sync.api_key \
                        to the config file."
                .into());
        }

        let workspace = Workspace::from_config(config);
        let store = workspace.store().expect("sync is configured");

        let cached = workspace.cache().load_bundle()?;
        let remote = store.read_once().await?;

        match (cached, remote) {
            (None, None) => println!("Nothing to sync."),
            (Some(local), None) => {
                store.write(&local).await?;
                println!("Pushed local bundle ({}).", stamp(local.last_update));
            }
            (None, Some(remote)) => {
                workspace.cache().save_bundle(&remote)?;
                println!("Fetched bundle from server ({}).", stamp(remote.last_update));
            }
            (Some(local), Some(remote)) => {
                if local.supersedes(&remote) {
                    store.write(&local).await?;
                    println!("Pushed local bundle ({}).", stamp(local.last_update));
                } else if remote.supersedes(&local) {
                    workspace.cache().save_bundle(&remote)?;
                    println!(
                        "Updated local cache from server ({}).",
                        stamp(remote.last_update)
                    );
                } else {
                    println!("Already in sync ({}).", stamp(local.last_update));
                }
            }
        }

        Ok(())
    }

    async fn status(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !config.sync.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"https://sync.example.com\"");
            println!("    api_key: \"your-key\"");
            println!();
            println!("Or set environment variables:");
            println!("  MARQUEE_SYNC_URL, MARQUEE_SYNC_API_KEY");
            return Ok(());
        }

        let workspace = Workspace::from_config(config);
        let store = workspace.store().expect("sync is configured");

        println!("Server:       {}", store.server_url());
        println!("Data dir:     {}", config.data_dir.value.display());

        let cached = workspace.cache().load_bundle()?;
        println!("Local bundle: {}", describe(&cached));

        print!("Server:       ");
        if !check_server(store.server_url()).await {
            println!("unreachable");
            return Ok(());
        }
        match store.read_once().await {
            Ok(remote) => {
                println!("reachable");
                println!("Remote bundle: {}", describe(&remote));
            }
            Err(e) => println!("error: {}", e),
        }

        Ok(())
    }
}

fn describe(bundle: &Option<Bundle>) -> String {
    match bundle {
        Some(bundle) => format!(
            "{} item(s), {} rule(s), updated {}",
            bundle.playlist.len(),
            bundle.schedules.len(),
            stamp(bundle.last_update)
        ),
        None => "absent".to_string(),
    }
}

fn stamp(last_update: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(last_update) {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("t={}", last_update),
    }
}
