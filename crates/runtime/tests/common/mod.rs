//! Shared fixtures for runtime integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use combat_core::{
    ActionDefinition, BattleId, BattleType, ContentRef, ContentType, DamageSpec,
    EffectDescriptor, EffectKind, LoadoutEntry, Participant, ParticipantId, Pools, Position,
    ResourceMeter, StaticCatalogue, TargetKind, TargetMethod, Team, Timestamp,
};
use runtime::{
    BattleService, BattleSetup, BattleStore, Entrant, InMemoryDirectory, ManualClock,
    RecordedOutcomes, RuntimeConfig,
};

pub const BATTLE: BattleId = BattleId(1);
pub const A: ParticipantId = ParticipantId(1);
pub const B: ParticipantId = ParticipantId(2);

pub fn strike() -> ContentRef {
    ContentRef::new(ContentType::Jutsu, "strike")
}

pub fn catalogue() -> StaticCatalogue {
    StaticCatalogue::new().with(
        ActionDefinition::new(
            ContentType::Jutsu,
            "strike",
            "strike",
            TargetKind::Opponent,
            TargetMethod::Single,
            1,
        )
        .with_action_cost(80.0)
        .with_effect(EffectDescriptor::new(EffectKind::Damage(DamageSpec::fixed(30.0)))),
    )
}

/// A at (0,0) and B at (1,0); B starts with `b_health` of 100 health.
pub fn directory(b_health: u32) -> InMemoryDirectory {
    let loadout = vec![LoadoutEntry::unlimited(strike())];
    let mut b_pools = Pools::full(100, 100, 100);
    b_pools.health = ResourceMeter::new(b_health, 100);
    InMemoryDirectory::with_participants([
        Participant::new(A, "A", Team(1), Position::new(0, 0)).with_loadout(loadout.clone()),
        Participant::new(B, "B", Team(2), Position::new(1, 0))
            .with_loadout(loadout)
            .with_pools(b_pools),
    ])
}

pub fn setup() -> BattleSetup {
    BattleSetup::new(
        BATTLE,
        BattleType::Arena,
        vec![
            Entrant::new(A, Team(1), Position::new(0, 0)),
            Entrant::new(B, Team(2), Position::new(1, 0)),
        ],
    )
}

pub struct Harness {
    pub service: BattleService,
    pub clock: Arc<ManualClock>,
    pub directory: Arc<InMemoryDirectory>,
    pub outcomes: Arc<RecordedOutcomes>,
}

pub fn harness(store: Arc<dyn BattleStore>, b_health: u32) -> Harness {
    harness_with(store, directory(b_health))
}

pub fn harness_with(store: Arc<dyn BattleStore>, directory: InMemoryDirectory) -> Harness {
    let clock = Arc::new(ManualClock::new(Timestamp(0)));
    let directory = Arc::new(directory);
    let outcomes = Arc::new(RecordedOutcomes::new());
    let service = BattleService::builder()
        .config(RuntimeConfig::default())
        .store(store)
        .catalogue(Arc::new(catalogue()))
        .clock(clock.clone())
        .directory(directory.clone())
        .outcomes(outcomes.clone())
        .build()
        .expect("service");
    Harness {
        service,
        clock,
        directory,
        outcomes,
    }
}
