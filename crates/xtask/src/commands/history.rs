//! Read a battle's action history
//!
//! Rows come back in version order; `--rounds` groups them the way a battle
//! log is displayed.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use combat_core::{BattleAction, BattleId, LineColor};
use runtime::HistoryRepository;
use runtime::repository::group_by_round;

use super::{OutputFormat, print_json};
use crate::dirs;

/// Page through a battle's action history
#[derive(Parser)]
pub struct History {
    /// Battle id
    #[arg(value_name = "ID")]
    id: u64,

    /// Only rows committed after this version
    #[arg(long, default_value_t = 0)]
    after: u64,

    /// Maximum number of rows
    #[arg(short, long, default_value_t = 50)]
    limit: usize,

    /// Group rows by round
    #[arg(long)]
    rounds: bool,

    /// Also print knockout pairings
    #[arg(long)]
    pairings: bool,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl History {
    pub fn execute(self) -> Result<()> {
        let store = dirs::open_store(self.data_dir)?;
        let id = BattleId(self.id);
        let actions = store
            .actions(id, self.after, self.limit)
            .with_context(|| format!("Failed to read history of {id}"))?;
        let pairings = if self.pairings {
            store.pairings(id)?
        } else {
            Vec::new()
        };

        if let OutputFormat::Json = self.format {
            return if self.pairings {
                print_json(&serde_json::json!({ "actions": actions, "pairings": pairings }))
            } else {
                print_json(&actions)
            };
        }

        if actions.is_empty() {
            println!("{}", style("No history rows in range").dim());
        } else if self.rounds {
            for round in group_by_round(actions) {
                println!("{}", style(format!("=== Round {} ===", round.round)).bold().green());
                round.actions.iter().for_each(print_row);
                println!();
            }
        } else {
            actions.iter().for_each(print_row);
        }

        if self.pairings {
            println!("{}", style("Knockouts:").bold().yellow());
            for pairing in &pairings {
                println!(
                    "  {} knocked out {} at {}",
                    pairing.attacker, pairing.defender, pairing.created_at
                );
            }
        }
        Ok(())
    }
}

fn print_row(action: &BattleAction) {
    println!(
        "{} {}",
        style(format!("v{}", action.battle_version)).cyan(),
        style(&action.description).bold()
    );
    for line in &action.applied_effects {
        let text = match line.color {
            LineColor::Red => style(&line.text).red(),
            LineColor::Green => style(&line.text).green(),
            LineColor::Blue => style(&line.text).blue(),
        };
        println!("    {}", text);
    }
}
