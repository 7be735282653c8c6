//! Effect descriptors and the engine that applies them.
//!
//! An [`EffectDescriptor`] is a closed sum type: every kind carries only the
//! fields it needs, and every consumer dispatches with an exhaustive match.
//!
//! Instant kinds (damage, heal, cleanse, move, flee, one-hit kills) resolve
//! immediately. Everything else is timed: stored on the battle with a
//! remaining-rounds counter and dropped when it reaches zero. Timed kinds on
//! a participant shape later resolutions: prevents block stuns, flee, seals
//! and one-hit kills, and the damage modifiers reshape every hit.

pub mod damage;
mod engine;

pub use engine::{
    Application, EffectContext, EffectError, advance_effects, apply_effect, has_effect,
    pool_cost_adjustment, prune_expired, stun_reduction,
};

use crate::state::{Element, General, Style};

/// How an effect's power turns into a magnitude.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Calculation {
    /// Power is the magnitude.
    Static,
    /// Power is a percentage of the target's pool maximum (or base rating).
    Percentage,
    /// Power feeds the stat-pairing formula.
    #[default]
    Formula,
}

/// Who receives an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectTarget {
    /// Whatever the action resolved to.
    #[default]
    Inherit,
    /// The participant performing the action.
    Caster,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageSpec {
    pub power: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub calculation: Calculation,
    #[cfg_attr(feature = "serde", serde(default))]
    pub styles: Vec<Style>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub generals: Vec<General>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Option<Element>,
}

impl DamageSpec {
    pub fn fixed(power: f64) -> Self {
        Self {
            power,
            calculation: Calculation::Static,
            styles: Vec::new(),
            generals: Vec::new(),
            element: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealSpec {
    pub power: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub calculation: Calculation,
}

/// Payload re-applied every round by a residual effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResidualPayload {
    Damage(DamageSpec),
    Heal(HealSpec),
}

/// Effect variants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    Damage(DamageSpec),
    Heal(HealSpec),
    /// Buff (positive power) or debuff (negative power) on style and general
    /// ratings.
    StatAdjust {
        power: f64,
        calculation: Calculation,
        styles: Vec<Style>,
        generals: Vec<General>,
    },
    /// Lowers the target's usable action points while active.
    Stun { power: u32 },
    /// Removes active effects with matching tags; an empty list removes all.
    Cleanse { tags: Vec<EffectTag> },
    /// Damage or heal over time.
    Residual(ResidualPayload),
    /// Relocates the caster onto the target tile.
    Move,
    /// Leaves the battle when the d100 roll is at most `chance`.
    Flee { chance: u32 },
    /// Tile-blocking object that absorbs `power` points of damage.
    Barrier { power: f64 },
    /// New stuns on the target are resisted while active.
    StunPrevent,
    /// Flee attempts by the target fail while active.
    FleePrevent,
    /// Blocks the target's bloodline actions. Lands when the d100 roll is at
    /// most `chance`.
    Seal { chance: u32 },
    SealPrevent,
    /// Knocks the target out outright when the d100 roll is at most `chance`.
    OneHitKill { chance: u32 },
    OneHitKillPrevent,
    /// Turns part of every hit the target takes into health.
    Absorb { power: f64, calculation: Calculation },
    /// Sends part of every hit the target takes back to the attacker.
    Reflect { power: f64, calculation: Calculation },
    /// Raises (negative power: lowers) damage the target deals.
    AdjustDamageGiven { power: f64, calculation: Calculation },
    /// Lowers (negative power: raises) damage the target takes.
    AdjustDamageTaken { power: f64, calculation: Calculation },
    /// Scales the pool costs of the target's actions by `power` percent.
    PoolCostAdjust { power: f64 },
}

/// Discriminant of [`EffectKind`], used for stacking and cleansing.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EffectTag {
    Damage,
    Heal,
    StatAdjust,
    Stun,
    Cleanse,
    Residual,
    Move,
    Flee,
    Barrier,
    StunPrevent,
    FleePrevent,
    Seal,
    SealPrevent,
    OneHitKill,
    OneHitKillPrevent,
    Absorb,
    Reflect,
    AdjustDamageGiven,
    AdjustDamageTaken,
    PoolCostAdjust,
}

impl EffectKind {
    pub fn tag(&self) -> EffectTag {
        match self {
            EffectKind::Damage(_) => EffectTag::Damage,
            EffectKind::Heal(_) => EffectTag::Heal,
            EffectKind::StatAdjust { .. } => EffectTag::StatAdjust,
            EffectKind::Stun { .. } => EffectTag::Stun,
            EffectKind::Cleanse { .. } => EffectTag::Cleanse,
            EffectKind::Residual(_) => EffectTag::Residual,
            EffectKind::Move => EffectTag::Move,
            EffectKind::Flee { .. } => EffectTag::Flee,
            EffectKind::Barrier { .. } => EffectTag::Barrier,
            EffectKind::StunPrevent => EffectTag::StunPrevent,
            EffectKind::FleePrevent => EffectTag::FleePrevent,
            EffectKind::Seal { .. } => EffectTag::Seal,
            EffectKind::SealPrevent => EffectTag::SealPrevent,
            EffectKind::OneHitKill { .. } => EffectTag::OneHitKill,
            EffectKind::OneHitKillPrevent => EffectTag::OneHitKillPrevent,
            EffectKind::Absorb { .. } => EffectTag::Absorb,
            EffectKind::Reflect { .. } => EffectTag::Reflect,
            EffectKind::AdjustDamageGiven { .. } => EffectTag::AdjustDamageGiven,
            EffectKind::AdjustDamageTaken { .. } => EffectTag::AdjustDamageTaken,
            EffectKind::PoolCostAdjust { .. } => EffectTag::PoolCostAdjust,
        }
    }

    /// Timed kinds persist on the battle between rounds.
    pub fn is_timed(&self) -> bool {
        !matches!(
            self,
            EffectKind::Damage(_)
                | EffectKind::Heal(_)
                | EffectKind::Cleanse { .. }
                | EffectKind::Move
                | EffectKind::Flee { .. }
                | EffectKind::OneHitKill { .. }
        )
    }
}

/// One entry of an action definition's effect list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDescriptor {
    pub kind: EffectKind,
    /// Rounds a timed effect stays active. Ignored by instant kinds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rounds: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: EffectTarget,
}

impl EffectDescriptor {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            rounds: 0,
            target: EffectTarget::Inherit,
        }
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn on_caster(mut self) -> Self {
        self.target = EffectTarget::Caster;
        self
    }
}
