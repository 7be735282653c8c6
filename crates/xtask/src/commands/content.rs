//! Validate and list action content
//!
//! Loading goes through the same registry checks a service applies, so a
//! catalogue that lists cleanly here will load at startup.

use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;

use combat_content::{ActionLoader, ContentFactory, ContentRegistry};
use combat_core::action::basic;
use combat_core::{ActionDefinition, ContentCatalogue, ContentRef, ContentType};

use super::{OutputFormat, print_json};

/// Validate and list action content
#[derive(Parser)]
pub struct Content {
    /// Content directory with `engine.toml` and `actions/*.ron`.
    /// If not provided, the embedded catalogue is used
    #[arg(long, value_name = "DIR")]
    content_dir: Option<PathBuf>,

    /// Only list this content type
    #[arg(short = 't', long, value_name = "TYPE")]
    content_type: Option<ContentType>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl Content {
    pub fn execute(self) -> Result<()> {
        let registry = match &self.content_dir {
            Some(dir) => {
                let factory = ContentFactory::new(dir);
                // surfaces engine.toml errors alongside catalogue errors
                factory.load_config()?;
                factory.load_registry()?
            }
            None => ActionLoader::embedded()?,
        };

        let mut definitions: Vec<ActionDefinition> = basic::ALL
            .iter()
            .filter_map(|id| registry.resolve(&ContentRef::basic(*id)))
            .collect();
        definitions.extend(registry_definitions(&registry));
        definitions.retain(|definition| {
            self.content_type
                .is_none_or(|content_type| definition.content_type == content_type)
        });

        if let OutputFormat::Json = self.format {
            return print_json(&definitions);
        }

        println!(
            "{} {} registered, {} basic moves",
            style("✓").green().bold(),
            registry.len(),
            basic::ALL.len()
        );
        println!();
        for definition in &definitions {
            println!(
                "  {}:{} {} - {} {} range {} AP {}% cooldown {}",
                definition.content_type,
                style(&definition.id).bold(),
                style(&definition.name).cyan(),
                definition.target,
                definition.method,
                definition.range,
                definition.action_cost_perc,
                definition.cooldown
            );
        }
        Ok(())
    }
}

fn registry_definitions(registry: &ContentRegistry) -> Vec<ActionDefinition> {
    registry
        .references()
        .filter_map(|reference| registry.get(reference).cloned())
        .collect()
}
