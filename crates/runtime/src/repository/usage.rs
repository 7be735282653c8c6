//! Usage counter storage and win-rate queries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use combat_core::{BattleOutcome, BattleType, ContentType, UsageKey, UsageRecord};

use super::error::{RepositoryError, Result};
use super::traits::UsageRepository;

/// Filter over usage counter keys. `None` matches anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsageQuery {
    pub content_type: Option<ContentType>,
    pub content_id: Option<String>,
    pub battle_type: Option<BattleType>,
}

impl UsageQuery {
    pub fn content(content_type: ContentType, content_id: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type),
            content_id: Some(content_id.into()),
            battle_type: None,
        }
    }

    pub fn with_battle_type(mut self, battle_type: BattleType) -> Self {
        self.battle_type = Some(battle_type);
        self
    }

    pub fn matches(&self, key: &UsageKey) -> bool {
        self.content_type.is_none_or(|t| t == key.content_type)
            && self.content_id.as_deref().is_none_or(|id| id == key.content_id)
            && self.battle_type.is_none_or(|t| t == key.battle_type)
    }
}

/// Outcome totals over the counters matching a query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct UsageSummary {
    pub wins: u64,
    pub losses: u64,
    pub flees: u64,
}

impl UsageSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut summary, record| {
                match record.key.outcome {
                    BattleOutcome::Win => summary.wins += record.count,
                    BattleOutcome::Loss => summary.losses += record.count,
                    BattleOutcome::Flee => summary.flees += record.count,
                }
                summary
            })
    }

    pub fn total(&self) -> u64 {
        self.wins + self.losses + self.flees
    }

    /// Wins over all recorded uses, `None` before the first use.
    pub fn win_rate(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.wins as f64 / total as f64)
    }
}

fn accumulate(counters: &mut BTreeMap<UsageKey, u64>, records: &[UsageRecord]) {
    for record in records {
        *counters.entry(record.key.clone()).or_insert(0) += record.count;
    }
}

fn flatten(counters: &BTreeMap<UsageKey, u64>) -> Vec<UsageRecord> {
    counters
        .iter()
        .map(|(key, count)| UsageRecord {
            key: key.clone(),
            count: *count,
        })
        .collect()
}

/// In-memory usage counters.
#[derive(Default)]
pub struct InMemoryUsageStore {
    counters: RwLock<BTreeMap<UsageKey, u64>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageRepository for InMemoryUsageStore {
    fn record(&self, records: &[UsageRecord]) -> Result<()> {
        let mut counters = self
            .counters
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        accumulate(&mut counters, records);
        Ok(())
    }

    fn counters(&self) -> Result<Vec<UsageRecord>> {
        let counters = self
            .counters
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(flatten(&counters))
    }
}

/// Usage counters persisted as one bincode file, rewritten via temp file and
/// rename on every batch.
pub struct FileUsageStore {
    path: PathBuf,
    counters: RwLock<BTreeMap<UsageKey, u64>>,
}

impl FileUsageStore {
    pub const FILE_NAME: &'static str = "usage.bin";

    /// Opens `base_dir/usage.bin`, starting empty when it does not exist.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;
        let path = base_dir.join(Self::FILE_NAME);
        let counters = if path.exists() {
            let bytes = fs::read(&path)?;
            let records: Vec<UsageRecord> = bincode::deserialize(&bytes)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            let mut counters = BTreeMap::new();
            accumulate(&mut counters, &records);
            counters
        } else {
            BTreeMap::new()
        };
        tracing::debug!("Opened usage counters at {}", path.display());
        Ok(Self {
            path,
            counters: RwLock::new(counters),
        })
    }

    fn persist(&self, counters: &BTreeMap<UsageKey, u64>) -> Result<()> {
        let bytes = bincode::serialize(&flatten(counters))
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let temp_path = self.path.with_extension("bin.tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl UsageRepository for FileUsageStore {
    fn record(&self, records: &[UsageRecord]) -> Result<()> {
        let mut counters = self
            .counters
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        accumulate(&mut counters, records);
        self.persist(&counters)
    }

    fn counters(&self) -> Result<Vec<UsageRecord>> {
        let counters = self
            .counters
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(flatten(&counters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, battle_type: BattleType, outcome: BattleOutcome, count: u64) -> UsageRecord {
        UsageRecord {
            key: UsageKey {
                content_type: ContentType::Jutsu,
                content_id: id.to_string(),
                battle_type,
                outcome,
            },
            count,
        }
    }

    #[test]
    fn counters_accumulate_per_key() {
        let store = InMemoryUsageStore::new();
        store
            .record(&[
                record("fireball", BattleType::Arena, BattleOutcome::Win, 1),
                record("fireball", BattleType::Arena, BattleOutcome::Win, 2),
                record("fireball", BattleType::Arena, BattleOutcome::Loss, 1),
            ])
            .expect("record");

        let counters = store.counters().expect("counters");
        assert_eq!(counters.len(), 2);
        let summary = store
            .summary(&UsageQuery::content(ContentType::Jutsu, "fireball"))
            .expect("summary");
        assert_eq!(summary, UsageSummary { wins: 3, losses: 1, flees: 0 });
        assert_eq!(summary.win_rate(), Some(0.75));
    }

    #[test]
    fn query_filters_by_battle_type() {
        let store = InMemoryUsageStore::new();
        store
            .record(&[
                record("kunai", BattleType::Arena, BattleOutcome::Win, 1),
                record("kunai", BattleType::Tournament, BattleOutcome::Flee, 1),
            ])
            .expect("record");
        let query = UsageQuery::content(ContentType::Jutsu, "kunai").with_battle_type(BattleType::Tournament);
        let summary = store.summary(&query).expect("summary");
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.flees, 1);
        assert_eq!(UsageSummary::default().win_rate(), None);
    }

    #[test]
    fn file_counters_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = FileUsageStore::open(dir.path()).expect("open");
            store
                .record(&[record("fireball", BattleType::Quest, BattleOutcome::Win, 4)])
                .expect("record");
        }
        let reopened = FileUsageStore::open(dir.path()).expect("reopen");
        assert_eq!(reopened.counters().expect("counters")[0].count, 4);
    }
}
