use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod authoring;
mod commands;
mod config;

use commands::{
    ConfigCommand, ItemCommand, PlayCommand, ScheduleCommand, SearchCommand, SyncCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(version)]
#[command(about = "A shared-screen content player", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the player (headless viewer loop)
    Play(PlayCommand),

    /// Manage playlist items
    Item(ItemCommand),

    /// Manage schedule rules
    Schedule(ScheduleCommand),

    /// Show or change player settings
    Config(ConfigCommand),

    /// Search the external catalog
    Search(SearchCommand),

    /// Sync with the remote bundle store
    Sync(SyncCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    match &cli.command {
        Some(Commands::Play(cmd)) => cmd.run(&config),
        Some(Commands::Item(cmd)) => cmd.run(&config),
        Some(Commands::Schedule(cmd)) => cmd.run(&config),
        Some(Commands::Config(cmd)) => cmd.run(&config),
        Some(Commands::Search(cmd)) => cmd.run(&config),
        Some(Commands::Sync(cmd)) => cmd.run(&config),
        None => {
            println!("Use --help to see available commands");
            Ok(())
        }
    }
}
