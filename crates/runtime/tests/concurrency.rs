mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use combat_core::{
    ActionRequest, Battle, BattleAction, BattleHistory, BattleId, Position, Timestamp,
};
use runtime::{
    BattleRepository, BattleStore, CommitRecord, FileBattleStore, HistoryRepository,
    InMemoryBattleStore, RepositoryError, RuntimeError,
};

use common::{A, BATTLE, harness, setup, strike};

fn row(description: &str) -> CommitRecord {
    CommitRecord::new(BattleAction {
        battle_id: BATTLE,
        battle_version: 0,
        battle_round: 1,
        description: description.to_string(),
        applied_effects: Vec::new(),
        created_at: Timestamp(0),
    })
}

/// Races `contenders` commits against the same expected version.
fn race(store: Arc<dyn BattleStore>, battle: &Battle, contenders: usize) -> usize {
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..contenders)
            .map(|n| {
                let store = store.clone();
                let next = battle.clone();
                scope.spawn(move || store.commit(BATTLE, 1, next, row(&format!("contender {n}"))))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("join"))
            .filter(|result| result.is_ok())
            .count()
    })
}

async fn seeded_battle(store: Arc<dyn BattleStore>) -> Battle {
    let h = harness(store, 100);
    h.service.start_battle(setup()).await.expect("start").battle
}

#[tokio::test]
async fn exactly_one_commit_wins_per_version_in_memory() {
    let store: Arc<dyn BattleStore> = Arc::new(InMemoryBattleStore::new());
    let battle = seeded_battle(store.clone()).await;

    assert_eq!(race(store.clone(), &battle, 8), 1);
    let stored = store.get(BATTLE).expect("get").expect("present");
    assert_eq!(stored.version, 2);
    assert_eq!(store.actions(BATTLE, 0, 100).expect("history").len(), 1);

    // the loser sees the winner's version on re-fetch
    assert!(matches!(
        store.commit(BATTLE, 1, battle.clone(), row("late")),
        Err(RepositoryError::VersionConflict { actual: 2, .. })
    ));
}

#[tokio::test]
async fn exactly_one_commit_wins_per_version_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn BattleStore> = Arc::new(FileBattleStore::new(dir.path()).expect("store"));
    let battle = seeded_battle(store.clone()).await;

    assert_eq!(race(store.clone(), &battle, 8), 1);
    assert_eq!(store.get(BATTLE).expect("get").map(|b| b.version), Some(2));
    assert_eq!(store.actions(BATTLE, 0, 100).expect("history").len(), 1);
}

/// Delegates to an in-memory store but loses the first `conflicts` commits.
struct Contended {
    inner: InMemoryBattleStore,
    conflicts: AtomicU32,
}

impl Contended {
    fn new(conflicts: u32) -> Self {
        Self {
            inner: InMemoryBattleStore::new(),
            conflicts: AtomicU32::new(conflicts),
        }
    }
}

impl BattleRepository for Contended {
    fn create(&self, battle: &Battle) -> runtime::repository::Result<()> {
        self.inner.create(battle)
    }

    fn get(&self, id: BattleId) -> runtime::repository::Result<Option<Battle>> {
        self.inner.get(id)
    }

    fn commit(
        &self,
        id: BattleId,
        expected_version: u64,
        next: Battle,
        record: CommitRecord,
    ) -> runtime::repository::Result<u64> {
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::VersionConflict {
                battle_id: id,
                expected: expected_version,
                actual: expected_version + 1,
            });
        }
        self.inner.commit(id, expected_version, next, record)
    }

    fn freeze(&self, id: BattleId, reason: &str) -> runtime::repository::Result<()> {
        self.inner.freeze(id, reason)
    }

    fn list(&self) -> runtime::repository::Result<Vec<BattleId>> {
        self.inner.list()
    }
}

impl HistoryRepository for Contended {
    fn actions(
        &self,
        id: BattleId,
        after_version: u64,
        limit: usize,
    ) -> runtime::repository::Result<Vec<BattleAction>> {
        self.inner.actions(id, after_version, limit)
    }

    fn pairings(&self, id: BattleId) -> runtime::repository::Result<Vec<BattleHistory>> {
        self.inner.pairings(id)
    }
}

#[tokio::test]
async fn conflicts_are_retried_on_fresh_state() {
    let h = harness(Arc::new(Contended::new(2)), 100);
    h.service.start_battle(setup()).await.expect("start");

    let submitted = h
        .service
        .submit(BATTLE, ActionRequest::new(A, strike(), Position::new(1, 0)))
        .await
        .expect("third attempt commits");
    assert_eq!(submitted.attempts, 3);
    assert_eq!(submitted.version(), 2);
}

#[tokio::test]
async fn exhausted_retries_require_a_refresh() {
    let h = harness(Arc::new(Contended::new(u32::MAX)), 100);
    h.service.start_battle(setup()).await.expect("start");

    let result = h
        .service
        .submit(BATTLE, ActionRequest::new(A, strike(), Position::new(1, 0)))
        .await;
    assert!(matches!(
        result,
        Err(RuntimeError::RefreshRequired { attempts: 3, .. })
    ));
    assert_eq!(h.service.snapshot(BATTLE, 0).expect("snapshot").version, 1);
}
