//! Engine configuration loader.

use std::path::Path;

use combat_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(source: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(source)
            .map_err(|e| anyhow::anyhow!("Failed to parse engine config TOML: {}", e))?;
        Ok(config)
    }
}
