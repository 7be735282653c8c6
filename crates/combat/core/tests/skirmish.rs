//! Multi-step battles driven through the public resolver API.

use combat_core::{
    ActionDefinition, ActionRequest, ActionResolver, Battle, BattleId, BattleType, Battlefield,
    ContentRef, ContentType, DamageSpec, EffectDescriptor, EffectKind, EngineConfig,
    LoadoutEntry, Participant, ParticipantId, Position, StaticCatalogue, TargetKind,
    TargetMethod, Team, Timestamp,
};

const A: ParticipantId = ParticipantId(1);
const B: ParticipantId = ParticipantId(2);
const D: ParticipantId = ParticipantId(3);

fn jutsu(id: &str) -> ContentRef {
    ContentRef::new(ContentType::Jutsu, id)
}

fn catalogue() -> StaticCatalogue {
    let damage = |power| EffectDescriptor::new(EffectKind::Damage(DamageSpec::fixed(power)));
    StaticCatalogue::new()
        .with(
            ActionDefinition::new(
                ContentType::Jutsu,
                "strike",
                "strike",
                TargetKind::Opponent,
                TargetMethod::Single,
                1,
            )
            .with_action_cost(80.0)
            .with_effect(damage(30.0)),
        )
        .with(
            ActionDefinition::new(
                ContentType::Jutsu,
                "wave",
                "wave",
                TargetKind::Opponent,
                TargetMethod::AoeLineShoot,
                3,
            )
            .with_action_cost(40.0)
            .with_effect(damage(5.0)),
        )
}

fn fighter(id: ParticipantId, name: &str, team: u32, x: i32) -> Participant {
    Participant::new(id, name, Team(team), Position::new(x, 0))
        .with_loadout(vec![
            LoadoutEntry::unlimited(jutsu("strike")),
            LoadoutEntry::unlimited(jutsu("wave")),
        ])
}

fn health(battle: &Battle, id: ParticipantId) -> Option<u32> {
    battle.participant(id).map(|p| p.pools.health.current)
}

#[test]
fn round_turns_over_once_nobody_can_act() {
    let config = EngineConfig::default();
    let catalogue = catalogue();
    let resolver = ActionResolver::new(&catalogue, &config);
    let battle = Battle::new(
        BattleId(1),
        BattleType::Sparring,
        Battlefield::default(),
        vec![fighter(A, "A", 1, 0), fighter(B, "B", 2, 1)],
        Timestamp(0),
    )
    .expect("valid battle");

    let first = resolver
        .resolve(
            &battle,
            &ActionRequest::new(A, jutsu("strike"), Position::new(1, 0)),
            Timestamp(0),
        )
        .expect("A strikes");
    let mut battle = first.battle;
    battle.version = first.action.battle_version;
    assert_eq!(resolver.initiative(&battle, Timestamp(1_000), 0).active, Some(B));

    let second = resolver
        .resolve(
            &battle,
            &ActionRequest::new(B, jutsu("strike"), Position::new(0, 0)),
            Timestamp(1_000),
        )
        .expect("B strikes back");
    let mut battle = second.battle;
    battle.version = second.action.battle_version;
    assert!(!second.round_advanced);

    let due = resolver.initiative(&battle, Timestamp(2_000), 0);
    assert!(due.advanced);
    assert_eq!(due.round, 2);
    assert_eq!(due.active, Some(A));

    let third = resolver
        .resolve(
            &battle,
            &ActionRequest::new(A, jutsu("strike"), Position::new(1, 0)),
            Timestamp(2_000),
        )
        .expect("A opens round two");
    assert!(third.round_advanced);
    assert_eq!(third.battle.round, 2);
    assert_eq!(third.action.battle_round, 2);
    assert_eq!(third.action.battle_version, 4);
    assert_eq!(health(&third.battle, B), Some(40));
    assert_eq!(health(&third.battle, A), Some(70));
}

#[test]
fn line_technique_hits_everyone_in_its_path() {
    let config = EngineConfig::default();
    let catalogue = catalogue();
    let resolver = ActionResolver::new(&catalogue, &config);
    let battle = Battle::new(
        BattleId(2),
        BattleType::Arena,
        Battlefield::default(),
        vec![
            fighter(A, "A", 1, 0),
            fighter(B, "B", 2, 2),
            fighter(D, "D", 2, 3),
        ],
        Timestamp(0),
    )
    .expect("valid battle");

    let resolution = resolver
        .resolve(
            &battle,
            &ActionRequest::new(A, jutsu("wave"), Position::new(3, 0)),
            Timestamp(0),
        )
        .expect("wave resolves");

    assert_eq!(health(&resolution.battle, B), Some(95));
    assert_eq!(health(&resolution.battle, D), Some(95));
    assert_eq!(health(&resolution.battle, A), Some(100));
    assert_eq!(
        resolution.battle.participant(A).map(|p| p.action_points),
        Some(60)
    );
    assert!(resolution.conclusion.is_none());
}
