//! Action catalogue loader.
//!
//! Loads technique, item and bloodline definitions from RON data files.

use std::path::Path;

use anyhow::Context;
use combat_core::ActionDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};
use crate::registry::ContentRegistry;

/// Action catalogue structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub actions: Vec<ActionDefinition>,
}

/// Loader for action catalogues.
pub struct ActionLoader;

impl ActionLoader {
    /// Load an action catalogue from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<ActionDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Parse an action catalogue from RON source.
    pub fn parse(source: &str) -> LoadResult<Vec<ActionDefinition>> {
        let catalog: ActionCatalog = ron::from_str(source)
            .map_err(|e| anyhow::anyhow!("Failed to parse action catalogue RON: {}", e))?;
        Ok(catalog.actions)
    }

    /// Builds a registry from the catalogues shipped with this crate.
    pub fn embedded() -> LoadResult<ContentRegistry> {
        let sources = [
            ("jutsu.ron", include_str!("../../data/actions/jutsu.ron")),
            ("items.ron", include_str!("../../data/actions/items.ron")),
            ("bloodlines.ron", include_str!("../../data/actions/bloodlines.ron")),
        ];

        let mut registry = ContentRegistry::new();
        for (name, source) in sources {
            let definitions = Self::parse(source).with_context(|| format!("in embedded {name}"))?;
            registry
                .register_all(definitions)
                .with_context(|| format!("in embedded {name}"))?;
        }
        Ok(registry)
    }
}
