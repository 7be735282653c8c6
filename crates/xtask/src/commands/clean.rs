//! Clean stored battles and usage counters
//!
//! Safety: Always prompts for confirmation before deletion.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::io::{self, Write};
use std::path::PathBuf;

use runtime::FileUsageStore;

use crate::dirs;

/// Delete stored battles and usage counters
#[derive(Parser, Debug)]
pub struct Clean {
    /// Delete only this battle
    #[arg(long, value_name = "ID")]
    pub battle: Option<u64>,

    /// Keep usage counters
    #[arg(long)]
    pub keep_usage: bool,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Skip confirmation prompt (dangerous!)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        let data_dir = dirs::data_dir(self.data_dir.clone());
        if !data_dir.exists() {
            println!(
                "{}",
                style("Nothing to clean - data directory doesn't exist yet").dim()
            );
            return Ok(());
        }

        let mut targets = Vec::new();
        for entry in std::fs::read_dir(&data_dir)
            .with_context(|| format!("Failed to read data directory: {}", data_dir.display()))?
        {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let selected = match self.battle {
                Some(id) => name == format!("battle_{id}"),
                None => {
                    name.starts_with("battle_")
                        || (!self.keep_usage && name == FileUsageStore::FILE_NAME)
                }
            };
            if selected {
                targets.push(path);
            }
        }
        targets.sort();

        if targets.is_empty() {
            println!("{}", style("Nothing to clean").dim());
            return Ok(());
        }

        println!("{}", style("Clean Battle Data").yellow().bold());
        println!();
        println!("The following will be deleted:");
        for path in &targets {
            println!("  {} {}", style("→").cyan(), style(path.display()).dim());
        }
        println!();

        if !self.yes && !confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        for path in targets {
            print!("Deleting {}... ", path.display());
            io::stdout().flush()?;

            if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            }
            .with_context(|| format!("Failed to delete: {}", path.display()))?;

            println!("{}", style("✓").green());
        }

        println!();
        println!("{}", style("✓ Cleanup complete!").green().bold());
        Ok(())
    }
}

/// Prompt user for confirmation
fn confirm() -> Result<bool> {
    print!("{} ", style("Proceed? [y/N]").yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
