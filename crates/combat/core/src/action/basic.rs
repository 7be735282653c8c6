//! Basic moves every participant can use without a loadout entry.

use super::definition::{ActionDefinition, ContentType, TargetKind, TargetMethod};
use crate::effect::{Calculation, DamageSpec, EffectDescriptor, EffectKind, HealSpec};
use crate::state::{General, Pool, Style};

pub const ATTACK: &str = "sp";
pub const HEAL: &str = "cp";
pub const MOVE: &str = "move";
pub const FLEE: &str = "flee";
pub const WAIT: &str = "wait";

/// Identifiers of every basic move.
pub const ALL: [&str; 5] = [ATTACK, HEAL, MOVE, FLEE, WAIT];

pub fn lookup(id: &str) -> Option<ActionDefinition> {
    let definition = match id {
        ATTACK => attack(),
        HEAL => heal(),
        MOVE => movement(),
        FLEE => flee(),
        WAIT => wait(),
        _ => return None,
    };
    Some(definition)
}

fn basic(
    id: &str,
    name: &str,
    target: TargetKind,
    range: u32,
    description: &str,
) -> ActionDefinition {
    ActionDefinition::new(ContentType::Basic, id, name, target, TargetMethod::Single, range)
        .with_description(description)
}

fn attack() -> ActionDefinition {
    basic(
        ATTACK,
        "Basic Attack",
        TargetKind::OtherUser,
        1,
        "%user performs a basic physical strike against %target",
    )
    .with_action_cost(60.0)
    .with_pool_cost(Pool::Stamina, 10.0)
    .with_effect(EffectDescriptor::new(EffectKind::Damage(DamageSpec {
        power: 1.0,
        calculation: Calculation::Formula,
        styles: vec![Style::Taijutsu],
        generals: vec![General::Strength],
        element: None,
    })))
}

fn heal() -> ActionDefinition {
    basic(
        HEAL,
        "Basic Heal",
        TargetKind::Character,
        1,
        "%user performs basic healing of %target",
    )
    .with_action_cost(50.0)
    .with_pool_cost(Pool::Chakra, 1.0)
    .with_effect(EffectDescriptor::new(EffectKind::Heal(HealSpec {
        power: 5.0,
        calculation: Calculation::Percentage,
    })))
}

fn movement() -> ActionDefinition {
    basic(
        MOVE,
        "Move",
        TargetKind::EmptyGround,
        1,
        "%user moves to %location",
    )
    .with_action_cost(30.0)
    .with_effect(EffectDescriptor::new(EffectKind::Move))
}

fn flee() -> ActionDefinition {
    let mut definition = basic(
        FLEE,
        "Flee",
        TargetKind::SelfTarget,
        0,
        "%user attempts to flee the battle",
    )
    .with_action_cost(100.0)
    .with_pool_cost(Pool::Health, 0.1)
    .with_effect(EffectDescriptor::new(EffectKind::Flee { chance: 20 }));
    definition.off_turn = true;
    definition
}

fn wait() -> ActionDefinition {
    let mut definition = basic(
        WAIT,
        "End Turn",
        TargetKind::SelfTarget,
        0,
        "%user stands and does nothing",
    );
    definition.ends_turn = true;
    definition
}
