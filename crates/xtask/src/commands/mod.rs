//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod battle;
mod clean;
mod content;
mod history;
mod usage;

pub use battle::{Battles, ReadBattle};
pub use clean::Clean;
pub use content::Content;
pub use history::History;
pub use usage::Usage;

/// Output format shared by the inspection commands
#[derive(Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Full JSON output
    Json,
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
