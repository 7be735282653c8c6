//! File-backed battle store.
//!
//! # File Structure
//!
//! ```text
//! {base_dir}/
//!   ├── battle_{id}/
//!   │   ├── state.bin      digest envelope of the latest snapshot
//!   │   ├── commits.log    one CommitRecord per committed version
//!   │   └── FROZEN         present once the battle is frozen, holds the reason
//!   └── ...
//! ```
//!
//! A commit appends its record before replacing the snapshot. A record whose
//! version is ahead of the snapshot belongs to an interrupted commit and is
//! ignored; when the version is committed again the later record wins.

mod log;
mod state;

pub use log::RecordLog;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use combat_core::{Battle, BattleAction, BattleHistory, BattleId, BattleStatus};

use super::error::{RepositoryError, Result};
use super::memory::{check_commit, stamp};
use super::traits::{BattleRepository, HistoryRepository};
use super::types::CommitRecord;

const STATE_FILE: &str = "state.bin";
const COMMITS_FILE: &str = "commits.log";
const FROZEN_FILE: &str = "FROZEN";

/// File-based implementation of [`BattleRepository`] and
/// [`HistoryRepository`].
///
/// Writers serialize on a process-wide lock; the check-and-swap happens
/// inside it.
pub struct FileBattleStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBattleStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn battle_dir(&self, id: BattleId) -> PathBuf {
        self.base_dir.join(format!("battle_{}", id.0))
    }

    fn state_path(&self, id: BattleId) -> PathBuf {
        self.battle_dir(id).join(STATE_FILE)
    }

    fn commits(&self, id: BattleId) -> RecordLog<CommitRecord> {
        RecordLog::new(self.battle_dir(id).join(COMMITS_FILE))
    }

    fn is_frozen(&self, id: BattleId) -> bool {
        self.battle_dir(id).join(FROZEN_FILE).exists()
    }

    fn load(&self, id: BattleId) -> Result<Option<Battle>> {
        let mut battle = state::read_state(&self.state_path(id), id)?;
        if let Some(battle) = battle.as_mut()
            && self.is_frozen(id)
        {
            battle.status = BattleStatus::Frozen;
        }
        Ok(battle)
    }

    /// Records of committed versions, one per version, ascending.
    fn committed_records(&self, id: BattleId) -> Result<Vec<CommitRecord>> {
        let current = self
            .load(id)?
            .ok_or(RepositoryError::NotFound(id))?
            .version;
        let records = self.commits(id).read_all().map_err(|error| match error {
            RepositoryError::PartialWrite { .. } | RepositoryError::Serialization(_) => {
                RepositoryError::Corrupted {
                    battle_id: id,
                    reason: format!("history log: {error}"),
                }
            }
            other => other,
        })?;

        let mut committed: Vec<CommitRecord> = Vec::with_capacity(records.len());
        for record in records {
            let version = record.action.battle_version;
            if version > current {
                continue;
            }
            match committed
                .iter()
                .position(|kept| kept.action.battle_version == version)
            {
                Some(index) => committed[index] = record,
                None => committed.push(record),
            }
        }
        committed.sort_by_key(|record| record.action.battle_version);
        Ok(committed)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)
    }
}

impl BattleRepository for FileBattleStore {
    fn create(&self, battle: &Battle) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.state_path(battle.id);
        if path.exists() {
            return Err(RepositoryError::AlreadyExists(battle.id));
        }
        fs::create_dir_all(self.battle_dir(battle.id)).map_err(RepositoryError::Io)?;
        state::write_state(&path, battle)
    }

    fn get(&self, id: BattleId) -> Result<Option<Battle>> {
        self.load(id)
    }

    fn commit(
        &self,
        id: BattleId,
        expected_version: u64,
        mut next: Battle,
        mut record: CommitRecord,
    ) -> Result<u64> {
        let _guard = self.lock()?;
        let stored = self.load(id)?.ok_or(RepositoryError::NotFound(id))?;
        check_commit(&stored, expected_version, &next)?;

        let version = expected_version + 1;
        stamp(id, version, &mut next, &mut record);
        self.commits(id).append(&record)?;
        state::write_state(&self.state_path(id), &next)?;
        Ok(version)
    }

    fn freeze(&self, id: BattleId, reason: &str) -> Result<()> {
        let _guard = self.lock()?;
        let dir = self.battle_dir(id);
        if !dir.exists() {
            return Err(RepositoryError::NotFound(id));
        }
        fs::write(dir.join(FROZEN_FILE), reason).map_err(RepositoryError::Io)?;
        tracing::error!(battle = %id, reason, "battle frozen");
        Ok(())
    }

    fn list(&self) -> Result<Vec<BattleId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)? {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();
            if let Some(id) = path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|name| name.strip_prefix("battle_"))
                .and_then(|id| id.parse::<u64>().ok())
            {
                ids.push(BattleId(id));
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

impl HistoryRepository for FileBattleStore {
    fn actions(&self, id: BattleId, after_version: u64, limit: usize) -> Result<Vec<BattleAction>> {
        Ok(self
            .committed_records(id)?
            .into_iter()
            .map(|record| record.action)
            .filter(|action| action.battle_version > after_version)
            .take(limit)
            .collect())
    }

    fn pairings(&self, id: BattleId) -> Result<Vec<BattleHistory>> {
        Ok(self
            .committed_records(id)?
            .into_iter()
            .flat_map(|record| record.knockouts)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{battle, record};
    use combat_core::{BattleHistory, ParticipantId, Timestamp};
    use tempfile::TempDir;

    #[test]
    fn snapshot_and_history_survive_reopen() {
        let temp_dir = TempDir::new().expect("tempdir");
        let created = battle(4);
        {
            let store = FileBattleStore::new(temp_dir.path()).expect("store");
            store.create(&created).expect("create");
            let knockout = BattleHistory {
                battle_id: created.id,
                attacker: ParticipantId(1),
                defender: ParticipantId(2),
                created_at: Timestamp(5),
            };
            store
                .commit(
                    created.id,
                    1,
                    created.clone(),
                    record("hit").with_knockouts(vec![knockout]),
                )
                .expect("commit");
        }

        let store = FileBattleStore::new(temp_dir.path()).expect("reopen");
        let stored = store.get(created.id).expect("get").expect("present");
        assert_eq!(stored.version, 2);
        assert_eq!(store.actions(created.id, 0, 10).expect("history").len(), 1);
        assert_eq!(store.pairings(created.id).expect("pairings").len(), 1);
        assert_eq!(store.list().expect("list"), vec![created.id]);
    }

    #[test]
    fn tampered_snapshot_is_reported_as_corrupted() {
        let temp_dir = TempDir::new().expect("tempdir");
        let store = FileBattleStore::new(temp_dir.path()).expect("store");
        let created = battle(5);
        store.create(&created).expect("create");

        let path = store.state_path(created.id);
        let mut bytes = fs::read(&path).expect("read");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).expect("write");

        assert!(matches!(
            store.get(created.id),
            Err(RepositoryError::Corrupted { .. })
        ));
    }

    #[test]
    fn orphaned_record_is_ignored_and_replaced() {
        let temp_dir = TempDir::new().expect("tempdir");
        let store = FileBattleStore::new(temp_dir.path()).expect("store");
        let created = battle(6);
        store.create(&created).expect("create");

        // record of a commit interrupted before its snapshot landed
        let mut orphan = record("lost");
        orphan.action.battle_version = 2;
        store.commits(created.id).append(&orphan).expect("append");
        assert!(store.actions(created.id, 0, 10).expect("history").is_empty());

        store
            .commit(created.id, 1, created.clone(), record("kept"))
            .expect("commit");
        let rows = store.actions(created.id, 0, 10).expect("history");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "kept");
    }

    #[test]
    fn frozen_battle_rejects_commits() {
        let temp_dir = TempDir::new().expect("tempdir");
        let store = FileBattleStore::new(temp_dir.path()).expect("store");
        let created = battle(7);
        store.create(&created).expect("create");
        store.freeze(created.id, "manual").expect("freeze");

        assert_eq!(
            store.get(created.id).expect("get").map(|b| b.status),
            Some(BattleStatus::Frozen)
        );
        assert!(matches!(
            store.commit(created.id, 1, created.clone(), record("late")),
            Err(RepositoryError::NotWritable { .. })
        ));
    }
}
