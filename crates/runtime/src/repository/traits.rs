//! Repository contracts for battle state, history and usage counters.

use combat_core::{Battle, BattleAction, BattleHistory, BattleId, BattleStatus, UsageRecord};

use super::error::Result;
use super::types::CommitRecord;
use super::usage::{UsageQuery, UsageSummary};

/// Versioned battle snapshots behind a compare-and-swap write path.
///
/// Every successful commit bumps the stored version by exactly one and
/// appends exactly one history row, atomically. A stale `expected_version`
/// is rejected with [`RepositoryError::VersionConflict`]; nothing is merged.
///
/// [`RepositoryError::VersionConflict`]: super::RepositoryError::VersionConflict
pub trait BattleRepository: Send + Sync {
    /// Stores a fresh battle. Fails if the id is taken.
    fn create(&self, battle: &Battle) -> Result<()>;

    /// Latest snapshot. Its `version` is the concurrency token for the next
    /// commit.
    fn get(&self, id: BattleId) -> Result<Option<Battle>>;

    /// Replaces the snapshot iff the stored version equals
    /// `expected_version`. Returns the new version.
    fn commit(
        &self,
        id: BattleId,
        expected_version: u64,
        next: Battle,
        record: CommitRecord,
    ) -> Result<u64>;

    /// Conclusion commit: same CAS semantics, leaves the battle Concluded.
    fn archive(
        &self,
        id: BattleId,
        expected_version: u64,
        mut final_state: Battle,
        record: CommitRecord,
    ) -> Result<u64> {
        final_state.status = BattleStatus::Concluded;
        self.commit(id, expected_version, final_state, record)
    }

    /// Marks the battle Frozen. Later commits are rejected until the battle
    /// is repaired outside the engine.
    fn freeze(&self, id: BattleId, reason: &str) -> Result<()>;

    /// Ids of every stored battle, ascending.
    fn list(&self) -> Result<Vec<BattleId>>;
}

/// Append-only action history.
pub trait HistoryRepository: Send + Sync {
    /// Rows with `battle_version > after_version`, ascending, at most `limit`.
    fn actions(&self, id: BattleId, after_version: u64, limit: usize) -> Result<Vec<BattleAction>>;

    /// Knockout pairings in the order they were recorded.
    fn pairings(&self, id: BattleId) -> Result<Vec<BattleHistory>>;
}

/// Store holding both snapshots and history.
pub trait BattleStore: BattleRepository + HistoryRepository {}

impl<T: BattleRepository + HistoryRepository> BattleStore for T {}

/// Usage analytics counters. Write-only from the battle path.
pub trait UsageRepository: Send + Sync {
    /// Adds each record's count to its key.
    fn record(&self, records: &[UsageRecord]) -> Result<()>;

    /// Every counter, ordered by key.
    fn counters(&self) -> Result<Vec<UsageRecord>>;

    fn summary(&self, query: &UsageQuery) -> Result<UsageSummary> {
        Ok(UsageSummary::from_records(
            self.counters()?.iter().filter(|record| query.matches(&record.key)),
        ))
    }
}
