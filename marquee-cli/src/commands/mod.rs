mod config_cmd;
mod item;
mod play;
mod schedule;
mod search;
mod sync_cmd;

pub use config_cmd::ConfigCommand;
pub use item::ItemCommand;
pub use play::PlayCommand;
pub use schedule::ScheduleCommand;
pub use search::SearchCommand;
pub use sync_cmd::SyncCommand;

use clap::ValueEnum;
use std::io::{self, Write};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Asks the user to confirm a destructive action.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
