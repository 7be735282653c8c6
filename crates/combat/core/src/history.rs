//! Immutable records produced by committed transitions.

use crate::state::{BattleId, ParticipantId, Timestamp};

/// Colour class of an outcome line.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum LineColor {
    /// Damage taken.
    Red,
    /// Health restored.
    Green,
    /// Status changes, movement, fleeing.
    Blue,
}

/// One outcome line of a transition, e.g. "Sakura takes 30 damage".
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedEffect {
    pub text: String,
    pub color: LineColor,
}

impl AppliedEffect {
    pub fn new(text: impl Into<String>, color: LineColor) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// History row: exactly one per committed battle version.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleAction {
    pub battle_id: BattleId,
    /// Version the battle reached with this transition.
    pub battle_version: u64,
    pub battle_round: u32,
    pub description: String,
    pub applied_effects: Vec<AppliedEffect>,
    pub created_at: Timestamp,
}

/// Attacker/defender pairing recorded at a knockout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleHistory {
    pub battle_id: BattleId,
    pub attacker: ParticipantId,
    pub defender: ParticipantId,
    pub created_at: Timestamp,
}
