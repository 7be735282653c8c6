//! Content factory for building catalogues from a data directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use combat_core::EngineConfig;

use crate::loaders::{ActionLoader, ConfigLoader, LoadResult};
use crate::registry::ContentRegistry;

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── engine.toml
/// └── actions/
///     ├── jutsu.ron
///     ├── items.ron
///     └── bloodlines.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `engine.toml`, or defaults when the
    /// file is absent.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("engine.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no engine config, using defaults");
            return Ok(EngineConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load every `actions/*.ron` catalogue into one registry, in file name
    /// order.
    pub fn load_registry(&self) -> LoadResult<ContentRegistry> {
        let actions_dir = self.data_dir.join("actions");
        let mut files: Vec<PathBuf> = std::fs::read_dir(&actions_dir)
            .with_context(|| format!("Failed to list {}", actions_dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        files.sort();

        let mut registry = ContentRegistry::new();
        for path in &files {
            let definitions = ActionLoader::load(path)?;
            registry
                .register_all(definitions)
                .with_context(|| format!("in {}", path.display()))?;
        }
        tracing::debug!(
            files = files.len(),
            definitions = registry.len(),
            "loaded action catalogues"
        );
        Ok(registry)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_reads_a_data_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let actions = dir.path().join("actions");
        std::fs::create_dir(&actions).expect("mkdir");
        std::fs::write(
            actions.join("items.ron"),
            include_str!("../../data/actions/items.ron"),
        )
        .expect("write");
        std::fs::write(actions.join("notes.txt"), "ignored").expect("write");

        let factory = ContentFactory::new(dir.path());
        let registry = factory.load_registry().expect("loads");
        assert_eq!(registry.len(), 3);
        assert_eq!(factory.load_config().expect("defaults"), EngineConfig::default());
    }

    #[test]
    fn missing_actions_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ContentFactory::new(dir.path()).load_registry().is_err());
    }
}
