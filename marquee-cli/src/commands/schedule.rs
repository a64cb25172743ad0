use chrono::NaiveTime;
use clap::{Args, Subcommand};
use uuid::Uuid;

use marquee_core::ScheduleRule;

use super::{confirm, OutputFormat};
use crate::authoring::Workspace;
use crate::config::Config;

#[derive(Args)]
pub struct ScheduleCommand {
    #[command(subcommand)]
    pub command: ScheduleSubcommand,
}

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// Add a schedule rule
    Add {
        /// Rule name
        name: String,

        /// Target item ID (UUID)
        #[arg(long)]
        item: String,

        /// Days of week, e.g. "mon-fri", "sat,sun", "0,6"
        #[arg(long)]
        days: String,

        /// Window start (HH:MM)
        #[arg(long)]
        start: String,

        /// Window end (HH:MM, same day)
        #[arg(long)]
        end: String,
    },

    /// List schedule rules
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove a schedule rule
    Remove {
        /// Rule ID (UUID)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Enable a schedule rule
    Enable {
        /// Rule ID (UUID)
        id: String,
    },

    /// Disable a schedule rule
    Disable {
        /// Rule ID (UUID)
        id: String,
    },
}

impl ScheduleCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let workspace = Workspace::from_config(config);

        match &self.command {
            ScheduleSubcommand::Add {
                name,
                item,
                days,
                start,
                end,
            } => {
                let target =
                    Uuid::parse_str(item).map_err(|_| format!("Invalid item ID '{}'", item))?;
                let days = parse_days(days)?;
                let start = parse_time(start)?;
                let end = parse_time(end)?;

                let mut bundle = workspace.load_newest().await?;
                if bundle.find_item(&target).is_none() {
                    println!(
                        "Warning: no playlist item with ID {}; the rule will not match until it exists.",
                        target
                    );
                }
                if start > end {
                    println!(
                        "Warning: start is after end; this rule will never match (no overnight windows)."
                    );
                }

                let rule = ScheduleRule::new(name, target, days, start, end);
                println!("Added rule: {} ({})", rule.name, rule.id);
                bundle.schedules.push(rule);
                workspace.commit(&mut bundle).await?;
                Ok(())
            }

            ScheduleSubcommand::List { format } => {
                let bundle = workspace.load_newest().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&bundle.schedules)?)
                    }
                    OutputFormat::Text => {
                        if bundle.schedules.is_empty() {
                            println!("No schedule rules.");
                        }
                        for rule in &bundle.schedules {
                            let target = match bundle.find_item(&rule.target_item_id) {
                                Some(item) => item.title.clone(),
                                None => format!("missing item {}", rule.target_item_id),
                            };
                            println!("{}  {} -> {}", rule.id, rule, target);
                        }
                    }
                }
                Ok(())
            }

            ScheduleSubcommand::Remove { id, force } => {
                let id = Uuid::parse_str(id).map_err(|_| format!("Invalid rule ID '{}'", id))?;
                let mut bundle = workspace.load_newest().await?;

                let rule = bundle
                    .find_rule(&id)
                    .cloned()
                    .ok_or_else(|| format!("No rule with ID {}", id))?;

                if !force && !confirm(&format!("Remove rule '{}'?", rule.name))? {
                    println!("Cancelled.");
                    return Ok(());
                }

                bundle.schedules.retain(|r| r.id != id);
                workspace.commit(&mut bundle).await?;
                println!("Removed rule: {}", rule.name);
                Ok(())
            }

            ScheduleSubcommand::Enable { id } => self.set_active(&workspace, id, true).await,
            ScheduleSubcommand::Disable { id } => self.set_active(&workspace, id, false).await,
        }
    }

    async fn set_active(
        &self,
        workspace: &Workspace,
        id: &str,
        active: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let id = Uuid::parse_str(id).map_err(|_| format!("Invalid rule ID '{}'", id))?;
        let mut bundle = workspace.load_newest().await?;

        let rule = bundle
            .schedules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| format!("No rule with ID {}", id))?;
        rule.active = active;
        let name = rule.name.clone();

        workspace.commit(&mut bundle).await?;
        println!(
            "{} rule: {}",
            if active { "Enabled" } else { "Disabled" },
            name
        );
        Ok(())
    }
}

fn parse_time(input: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .map_err(|_| format!("Invalid time '{}'. Use HH:MM.", input))
}

/// Parses a day-of-week list: comma-separated names, numbers, or ranges
/// ("mon-fri", "sat,sun", "0,2,4").
fn parse_days(input: &str) -> Result<Vec<u8>, String> {
    let mut days = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((from, to)) = part.split_once('-') {
            let from = parse_day(from)?;
            let to = parse_day(to)?;
            if from > to {
                return Err(format!("Invalid day range '{}'", part));
            }
            for day in from..=to {
                if !days.contains(&day) {
                    days.push(day);
                }
            }
        } else {
            let day = parse_day(part)?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
    }

    if days.is_empty() {
        return Err("No days given. Use names (mon-fri) or numbers (0-6).".to_string());
    }
    Ok(days)
}

fn parse_day(input: &str) -> Result<u8, String> {
    match input.trim().to_lowercase().as_str() {
        "sun" | "sunday" | "0" => Ok(0),
        "mon" | "monday" | "1" => Ok(1),
        "tue" | "tuesday" | "2" => Ok(2),
        "wed" | "wednesday" | "3" => Ok(3),
        "thu" | "thursday" | "4" => Ok(4),
        "fri" | "friday" | "5" => Ok(5),
        "sat" | "saturday" | "6" => Ok(6),
        _ => Err(format!(
            "Invalid day '{}'. Use sun..sat or 0..6 (0 = Sunday).",
            input
        )),
    }
}
