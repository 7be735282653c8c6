//! Development tasks for the battle engine
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;

use anyhow::Result;
use clap::Parser;
use commands::{Battles, Clean, Content, History, ReadBattle, Usage};
use tracing_subscriber::EnvFilter;

/// Development tasks for the battle engine
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the battle engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// List stored battles
    Battles(Battles),

    /// Inspect one battle snapshot and its initiative
    Battle(ReadBattle),

    /// Page through a battle's action history
    History(History),

    /// Show usage counters and win rates
    Usage(Usage),

    /// Validate and list action content
    Content(Content),

    /// Delete stored battles and usage counters
    Clean(Clean),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for BATTLE_DATA_DIR and other env vars)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Battles(cmd) => cmd.execute(),
        Command::Battle(cmd) => cmd.execute(),
        Command::History(cmd) => cmd.execute(),
        Command::Usage(cmd) => cmd.execute(),
        Command::Content(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
    }
}
