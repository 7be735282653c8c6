//! Read and inspect stored battles
//!
//! Loads `battle_{id}/state.bin` through the file store, so digest checks
//! apply exactly as they do in a running service.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use combat_core::{Battle, BattleId, engine};
use runtime::{BattleRepository, BattleView, Clock, RuntimeConfig, SystemClock};

use super::{OutputFormat, print_json};
use crate::dirs;

/// List stored battles
#[derive(Parser)]
pub struct Battles {
    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

impl Battles {
    pub fn execute(self) -> Result<()> {
        let store = dirs::open_store(self.data_dir)?;
        let ids = store.list()?;

        if ids.is_empty() {
            println!("{}", style("No battles stored yet").dim());
            return Ok(());
        }

        println!("{}", style("=== Stored Battles ===").bold().green());
        for id in ids {
            match store.get(id) {
                Ok(Some(battle)) => {
                    let standing = battle.users_state.iter().filter(|p| p.is_standing()).count();
                    println!(
                        "  {} {} {} round {} v{} ({}/{} standing)",
                        style(id).cyan(),
                        battle.battle_type,
                        style(battle.status).yellow(),
                        battle.round,
                        battle.version,
                        standing,
                        battle.users_state.len()
                    );
                }
                Ok(None) => {}
                Err(e) => println!("  {} {} {}", style(id).cyan(), style("✗").red().bold(), e),
            }
        }
        Ok(())
    }
}

/// Inspect one battle snapshot and its initiative
#[derive(Parser)]
pub struct ReadBattle {
    /// Battle id
    #[arg(value_name = "ID")]
    id: u64,

    /// Client clock skew in milliseconds, subtracted from now
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset_ms: i64,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl ReadBattle {
    pub fn execute(self) -> Result<()> {
        let store = dirs::open_store(self.data_dir)?;
        let id = BattleId(self.id);
        let battle = store
            .get(id)
            .with_context(|| format!("Failed to load {id}"))?
            .with_context(|| format!("{id} not found"))?;

        let config = RuntimeConfig::from_env();
        let initiative =
            engine::evaluate(&battle, SystemClock.now(), self.offset_ms, &config.engine.clock);

        match self.format {
            OutputFormat::Json => print_json(&BattleView {
                version: battle.version,
                battle,
                initiative,
            }),
            OutputFormat::Summary => {
                print_summary(&battle, &initiative);
                Ok(())
            }
        }
    }
}

fn print_summary(battle: &Battle, initiative: &engine::Initiative) {
    println!("{}", style("=== Battle Summary ===").bold().green());
    println!();

    println!("{}", style("Battle:").bold().yellow());
    println!("  Id: {}", battle.id);
    println!("  Type: {}", battle.battle_type);
    println!("  Status: {}", battle.status);
    println!("  Version: {}", battle.version);
    println!(
        "  Battlefield: {}x{}",
        battle.battlefield.width, battle.battlefield.height
    );
    println!("  Reward Scaling: {}", battle.reward_scaling);
    println!();

    println!("{}", style("Initiative:").bold().yellow());
    println!("  Round: {}", initiative.round);
    if initiative.advanced {
        println!("  {}", style("Round change due on next action").dim());
    }
    println!("  Remaining: {}ms", initiative.remaining_ms());
    match initiative.active {
        Some(active) => println!("  Active: {}", style(active).cyan()),
        None => println!("  Active: {}", style("nobody can act").dim()),
    }
    println!();

    println!("{}", style("Participants:").bold().yellow());
    for p in &battle.users_state {
        let marker = if !p.is_standing() {
            style("✗").red()
        } else if initiative.is_active(p.id) {
            style("▶").green()
        } else {
            style("·").dim()
        };
        println!(
            "  {} {} {} team {} at {} - HP {}/{} CP {}/{} SP {}/{} AP {} (stored {})",
            marker,
            p.id,
            style(&p.name).bold(),
            p.team.0,
            p.position,
            p.pools.health.current,
            p.pools.health.maximum,
            p.pools.chakra.current,
            p.pools.chakra.maximum,
            p.pools.stamina.current,
            p.pools.stamina.maximum,
            initiative.usable_for(p.id),
            p.action_points
        );
    }
    println!();

    println!("{}", style("Effects:").bold().yellow());
    println!("  On participants: {}", battle.users_effects.len());
    println!("  On ground: {}", battle.ground_effects.len());
}
