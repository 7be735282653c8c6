//! Digest-checked snapshot files.
//!
//! A snapshot is stored as a bincode [`StateEnvelope`]: the bincode encoding
//! of the battle plus its SHA-256 digest. Loading recomputes the digest and
//! refuses the snapshot on mismatch.

use std::fs;
use std::path::Path;

use combat_core::state::compute_state_digest;
use combat_core::{Battle, BattleId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::repository::{RepositoryError, Result};

#[derive(Serialize, Deserialize)]
struct StateEnvelope {
    digest: [u8; 32],
    payload: Vec<u8>,
}

/// Writes the snapshot via temp file and atomic rename.
pub(crate) fn write_state(path: &Path, battle: &Battle) -> Result<()> {
    let payload =
        bincode::serialize(battle).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    let digest =
        compute_state_digest(battle).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    let bytes = bincode::serialize(&StateEnvelope { digest, payload })
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    let temp_path = path.with_extension("bin.tmp");
    fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
    fs::rename(&temp_path, path).map_err(RepositoryError::Io)?;

    tracing::debug!(
        "Saved {}[v{}] to {}",
        battle.id,
        battle.version,
        path.display()
    );
    Ok(())
}

/// Loads and verifies a snapshot. `None` when the file does not exist.
pub(crate) fn read_state(path: &Path, id: BattleId) -> Result<Option<Battle>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).map_err(RepositoryError::Io)?;
    let corrupted = |reason: String| RepositoryError::Corrupted {
        battle_id: id,
        reason,
    };

    let envelope: StateEnvelope = bincode::deserialize(&bytes)
        .map_err(|e| corrupted(format!("undecodable envelope: {e}")))?;
    let actual: [u8; 32] = Sha256::digest(&envelope.payload).into();
    if actual != envelope.digest {
        return Err(corrupted(format!(
            "digest mismatch: stored {}, computed {}",
            hex::encode(envelope.digest),
            hex::encode(actual)
        )));
    }
    let battle: Battle = bincode::deserialize(&envelope.payload)
        .map_err(|e| corrupted(format!("undecodable snapshot: {e}")))?;
    if battle.id != id {
        return Err(corrupted(format!("snapshot belongs to {}", battle.id)));
    }

    tracing::debug!("Loaded {}[v{}] from {}", id, battle.version, path.display());
    Ok(Some(battle))
}
