use clap::{Args, Subcommand};
use uuid::Uuid;

use marquee_core::PlayerMode;

use crate::authoring::Workspace;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show player settings and tool configuration
    Show,

    /// Set a player setting
    Set {
        /// One of: autoplay, muted, loop, use-schedule, language, mode, current-item
        key: String,

        /// New value ("none" clears current-item)
        value: String,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let workspace = Workspace::from_config(config);

        match &self.command {
            ConfigSubcommand::Show => {
                println!("Tool configuration");
                println!("==================");
                match &config.config_file {
                    Some(path) => println!("config file:   {}", path.display()),
                    None => println!("config file:   (none)"),
                }
                println!(
                    "data dir:      {} ({})",
                    config.data_dir.value.display(),
                    config.data_dir.source
                );
                println!(
                    "sync server:   {}",
                    config.sync.server_url.as_deref().unwrap_or("(not configured)")
                );
                println!(
                    "catalog:       {}",
                    if config.catalog.is_configured() {
                        config.catalog.base_url_or_default()
                    } else {
                        "(not configured)".to_string()
                    }
                );
                println!();

                let bundle = workspace.load_newest().await?;
                println!("Player settings");
                println!("===============");
                print!("{}", bundle.config);
                Ok(())
            }

            ConfigSubcommand::Set { key, value } => {
                let mut bundle = workspace.load_newest().await?;

                match key.as_str() {
                    "autoplay" => bundle.config.autoplay = parse_bool(value)?,
                    "muted" => bundle.config.muted = parse_bool(value)?,
                    "loop" => bundle.config.loop_playback = parse_bool(value)?,
                    "use-schedule" => bundle.config.use_schedule = parse_bool(value)?,
                    "language" => bundle.config.language = value.clone(),
                    "mode" => bundle.config.mode = value.parse::<PlayerMode>()?,
                    "current-item" => {
                        bundle.config.current_item_id = if value == "none" {
                            None
                        } else {
                            let id = Uuid::parse_str(value)
                                .map_err(|_| format!("Invalid item ID '{}'", value))?;
                            if bundle.find_item(&id).is_none() {
                                println!("Warning: no playlist item with ID {}.", id);
                            }
                            Some(id)
                        };
                    }
                    _ => {
                        return Err(format!(
                            "Unknown setting '{}'. Valid keys: autoplay, muted, loop, \
                             use-schedule, language, mode, current-item",
                            key
                        )
                        .into())
                    }
                }

                workspace.commit(&mut bundle).await?;
                println!("Set {} = {}", key, value);
                Ok(())
            }
        }
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" => Ok(true),
        "false" | "off" | "no" => Ok(false),
        _ => Err(format!("Invalid boolean '{}'. Use true or false.", value)),
    }
}
