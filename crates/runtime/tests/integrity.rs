mod common;

use std::sync::Arc;

use combat_core::{
    ActionRequest, Battle, BattleStatus, BattleType, Battlefield, Participant, Position, Team,
    Timestamp,
};
use runtime::{BattleEvent, BattleRepository, FileBattleStore, InMemoryBattleStore, RuntimeError};

use common::{A, B, BATTLE, harness, setup, strike};

fn tamper(path: &std::path::Path) {
    let mut bytes = std::fs::read(path).expect("read state");
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5A;
    std::fs::write(path, bytes).expect("write state");
}

#[tokio::test]
async fn corrupted_snapshot_freezes_the_battle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileBattleStore::new(dir.path()).expect("store"));
    let h = harness(store.clone(), 100);
    let mut events = h.service.subscribe();
    h.service.start_battle(setup()).await.expect("start");

    tamper(&dir.path().join("battle_1").join("state.bin"));

    let result = h
        .service
        .submit(BATTLE, ActionRequest::new(A, strike(), Position::new(1, 0)))
        .await;
    assert!(matches!(
        result,
        Err(RuntimeError::IntegrityFailure { battle_id, .. }) if battle_id == BATTLE
    ));
    assert!(dir.path().join("battle_1").join("FROZEN").exists());

    match events.recv().await.expect("event") {
        BattleEvent::Frozen { battle_id, reason } => {
            assert_eq!(battle_id, BATTLE);
            assert!(reason.contains("digest mismatch"));
        }
        other => panic!("unexpected event {other:?}"),
    }

    // never auto-repaired
    assert!(matches!(
        h.service.snapshot(BATTLE, 0),
        Err(RuntimeError::IntegrityFailure { .. })
    ));
}

#[tokio::test]
async fn intact_battle_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let h = harness(Arc::new(FileBattleStore::new(dir.path()).expect("store")), 100);
        h.service.start_battle(setup()).await.expect("start");
        h.service
            .submit(BATTLE, ActionRequest::new(A, strike(), Position::new(1, 0)))
            .await
            .expect("submit");
    }

    let h = harness(Arc::new(FileBattleStore::new(dir.path()).expect("reopen")), 100);
    let view = h.service.snapshot(BATTLE, 0).expect("snapshot");
    assert_eq!(view.version, 2);
    assert_eq!(view.battle.status, BattleStatus::Ongoing);
    assert_eq!(h.service.history(BATTLE, 0, 10).expect("history").len(), 1);
}

#[tokio::test]
async fn impossible_snapshot_is_refused_and_frozen() {
    let store = Arc::new(InMemoryBattleStore::new());
    let mut battle = Battle::new(
        BATTLE,
        BattleType::Sparring,
        Battlefield::default(),
        vec![
            Participant::new(A, "A", Team(1), Position::new(0, 0)),
            Participant::new(B, "B", Team(2), Position::new(1, 0)),
        ],
        Timestamp(0),
    )
    .expect("valid battle");
    battle.users_state[0].action_points = 500;
    battle.round = 0;
    store.create(&battle).expect("create");

    let h = harness(store.clone(), 100);
    let mut events = h.service.subscribe();
    for _ in 0..3 {
        let result = h
            .service
            .submit(BATTLE, ActionRequest::new(A, strike(), Position::new(1, 0)))
            .await;
        assert!(matches!(
            result,
            Err(RuntimeError::IntegrityFailure { battle_id, .. }) if battle_id == BATTLE
        ));
    }

    match events.recv().await.expect("event") {
        BattleEvent::Frozen { reason, .. } => assert!(reason.contains("round 0")),
        other => panic!("unexpected event {other:?}"),
    }
    let stored = store.get(BATTLE).expect("get").expect("present");
    assert_eq!(stored.status, BattleStatus::Frozen);
    assert_eq!(stored.version, 1);
    assert!(h.service.history(BATTLE, 0, 10).expect("history").is_empty());
}
