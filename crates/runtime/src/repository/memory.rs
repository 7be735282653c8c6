//! In-memory battle store for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use combat_core::{Battle, BattleAction, BattleHistory, BattleId, BattleStatus};

use super::error::{RepositoryError, Result};
use super::traits::{BattleRepository, HistoryRepository};
use super::types::CommitRecord;

struct Entry {
    battle: Battle,
    actions: Vec<BattleAction>,
    pairings: Vec<BattleHistory>,
}

/// In-memory implementation of [`BattleRepository`] and
/// [`HistoryRepository`].
///
/// One lock covers snapshots and history, so a commit swaps the snapshot and
/// appends its row in a single critical section.
#[derive(Default)]
pub struct InMemoryBattleStore {
    battles: RwLock<BTreeMap<BattleId, Entry>>,
}

impl InMemoryBattleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared CAS precondition of every store.
pub(crate) fn check_commit(stored: &Battle, expected_version: u64, next: &Battle) -> Result<()> {
    if next.id != stored.id {
        return Err(RepositoryError::MismatchedBattle {
            battle_id: stored.id,
            found: next.id,
        });
    }
    if stored.status != BattleStatus::Ongoing {
        return Err(RepositoryError::NotWritable {
            battle_id: stored.id,
            status: stored.status,
        });
    }
    if stored.version != expected_version {
        return Err(RepositoryError::VersionConflict {
            battle_id: stored.id,
            expected: expected_version,
            actual: stored.version,
        });
    }
    Ok(())
}

/// Stamps the committed version onto the snapshot and its history row.
pub(crate) fn stamp(id: BattleId, version: u64, next: &mut Battle, record: &mut CommitRecord) {
    next.version = version;
    record.action.battle_id = id;
    record.action.battle_version = version;
    for pairing in &mut record.knockouts {
        pairing.battle_id = id;
    }
}

impl BattleRepository for InMemoryBattleStore {
    fn create(&self, battle: &Battle) -> Result<()> {
        let mut battles = self
            .battles
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        if battles.contains_key(&battle.id) {
            return Err(RepositoryError::AlreadyExists(battle.id));
        }
        battles.insert(
            battle.id,
            Entry {
                battle: battle.clone(),
                actions: Vec::new(),
                pairings: Vec::new(),
            },
        );
        Ok(())
    }

    fn get(&self, id: BattleId) -> Result<Option<Battle>> {
        let battles = self
            .battles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(battles.get(&id).map(|entry| entry.battle.clone()))
    }

    fn commit(
        &self,
        id: BattleId,
        expected_version: u64,
        mut next: Battle,
        mut record: CommitRecord,
    ) -> Result<u64> {
        let mut battles = self
            .battles
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let entry = battles.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        check_commit(&entry.battle, expected_version, &next)?;

        let version = expected_version + 1;
        stamp(id, version, &mut next, &mut record);
        entry.battle = next;
        entry.actions.push(record.action);
        entry.pairings.extend(record.knockouts);
        Ok(version)
    }

    fn freeze(&self, id: BattleId, reason: &str) -> Result<()> {
        let mut battles = self
            .battles
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let entry = battles.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        entry.battle.status = BattleStatus::Frozen;
        tracing::error!(battle = %id, reason, "battle frozen");
        Ok(())
    }

    fn list(&self) -> Result<Vec<BattleId>> {
        let battles = self
            .battles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(battles.keys().copied().collect())
    }
}

impl HistoryRepository for InMemoryBattleStore {
    fn actions(&self, id: BattleId, after_version: u64, limit: usize) -> Result<Vec<BattleAction>> {
        let battles = self
            .battles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let entry = battles.get(&id).ok_or(RepositoryError::NotFound(id))?;
        Ok(entry
            .actions
            .iter()
            .filter(|action| action.battle_version > after_version)
            .take(limit)
            .cloned()
            .collect())
    }

    fn pairings(&self, id: BattleId) -> Result<Vec<BattleHistory>> {
        let battles = self
            .battles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let entry = battles.get(&id).ok_or(RepositoryError::NotFound(id))?;
        Ok(entry.pairings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{battle, record};

    #[test]
    fn commit_bumps_version_and_appends_one_row() {
        let store = InMemoryBattleStore::new();
        let created = battle(1);
        store.create(&created).expect("create");

        let version = store
            .commit(created.id, 1, created.clone(), record("first"))
            .expect("commit");
        assert_eq!(version, 2);

        let stored = store.get(created.id).expect("get").expect("present");
        assert_eq!(stored.version, 2);
        assert_eq!(stored.id, created.id);
        let rows = store.actions(created.id, 0, 10).expect("history");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].battle_version, 2);
    }

    #[test]
    fn stale_commit_is_rejected_without_side_effects() {
        let store = InMemoryBattleStore::new();
        let created = battle(1);
        store.create(&created).expect("create");
        store
            .commit(created.id, 1, created.clone(), record("winner"))
            .expect("commit");

        let stale = store.commit(created.id, 1, created.clone(), record("loser"));
        assert!(matches!(
            stale,
            Err(RepositoryError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert_eq!(store.actions(created.id, 0, 10).expect("history").len(), 1);
    }

    #[test]
    fn frozen_and_archived_battles_reject_commits() {
        let store = InMemoryBattleStore::new();
        let frozen = battle(1);
        store.create(&frozen).expect("create");
        store.freeze(frozen.id, "digest mismatch").expect("freeze");
        assert!(matches!(
            store.commit(frozen.id, 1, frozen.clone(), record("late")),
            Err(RepositoryError::NotWritable {
                status: BattleStatus::Frozen,
                ..
            })
        ));

        let finished = battle(2);
        store.create(&finished).expect("create");
        store
            .archive(finished.id, 1, finished.clone(), record("final"))
            .expect("archive");
        let stored = store.get(finished.id).expect("get").expect("present");
        assert_eq!(stored.status, BattleStatus::Concluded);
        assert!(store.commit(finished.id, 2, stored, record("late")).is_err());
    }

    #[test]
    fn history_pages_by_version() {
        let store = InMemoryBattleStore::new();
        let created = battle(1);
        store.create(&created).expect("create");
        for expected in 1..=4 {
            store
                .commit(created.id, expected, created.clone(), record("step"))
                .expect("commit");
        }
        let page: Vec<u64> = store
            .actions(created.id, 2, 2)
            .expect("page")
            .iter()
            .map(|a| a.battle_version)
            .collect();
        assert_eq!(page, vec![3, 4]);
        assert_eq!(store.list().expect("list"), vec![created.id]);
    }
}
