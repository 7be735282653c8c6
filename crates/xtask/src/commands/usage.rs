//! Show usage counters and win rates

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use combat_core::{BattleType, ContentType};
use runtime::{FileUsageStore, UsageQuery, UsageRepository, UsageSummary};

use super::{OutputFormat, print_json};
use crate::dirs;

/// Show usage counters and win rates
#[derive(Parser)]
pub struct Usage {
    /// Content type (jutsu, item, bloodline, basic, ai)
    #[arg(short = 't', long, value_name = "TYPE")]
    content_type: Option<ContentType>,

    /// Content id, e.g. great_fireball
    #[arg(short, long, value_name = "ID")]
    id: Option<String>,

    /// Battle type, e.g. arena
    #[arg(short, long, value_name = "BATTLE_TYPE")]
    battle_type: Option<BattleType>,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl Usage {
    pub fn execute(self) -> Result<()> {
        let dir = dirs::data_dir(self.data_dir);
        let store = FileUsageStore::open(&dir)
            .with_context(|| format!("Failed to open usage counters in {}", dir.display()))?;

        let query = UsageQuery {
            content_type: self.content_type,
            content_id: self.id,
            battle_type: self.battle_type,
        };
        let rows: Vec<_> = store
            .counters()?
            .into_iter()
            .filter(|record| query.matches(&record.key))
            .collect();
        let summary = UsageSummary::from_records(&rows);

        if let OutputFormat::Json = self.format {
            return print_json(&serde_json::json!({
                "summary": summary,
                "win_rate": summary.win_rate(),
                "counters": rows,
            }));
        }

        println!("{}", style("=== Usage Counters ===").bold().green());
        for row in &rows {
            println!(
                "  {}:{} {} {} x{}",
                row.key.content_type,
                style(&row.key.content_id).bold(),
                row.key.battle_type,
                row.key.outcome,
                row.count
            );
        }
        println!();
        println!(
            "{} {} wins, {} losses, {} flees",
            style("Totals:").bold().yellow(),
            summary.wins,
            summary.losses,
            summary.flees
        );
        match summary.win_rate() {
            Some(rate) => println!("{} {:.1}%", style("Win rate:").bold().yellow(), rate * 100.0),
            None => println!("{}", style("No recorded uses").dim()),
        }
        Ok(())
    }
}
