//! Platform-specific directory utilities
//!
//! Resolves the battle data directory the same way the runtime does, so the
//! tools read exactly what a service wrote.

use std::path::PathBuf;

use anyhow::Result;
use runtime::{FileBattleStore, RuntimeConfig};

/// Data directory: `--data-dir`, else `BATTLE_DATA_DIR`, else the platform
/// default.
pub fn data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| RuntimeConfig::from_env().resolved_data_dir())
}

/// Opens the battle store under the data directory, refusing to create one.
pub fn open_store(explicit: Option<PathBuf>) -> Result<FileBattleStore> {
    let dir = data_dir(explicit);
    if !dir.exists() {
        anyhow::bail!(
            "Data directory does not exist: {}\n\
             No battles found. Start a battle service with this directory first.",
            dir.display()
        );
    }
    Ok(FileBattleStore::new(&dir)?)
}
