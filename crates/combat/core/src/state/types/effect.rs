use super::common::{ParticipantId, Position};
use crate::action::ContentRef;
use crate::effect::{EffectKind, EffectTag};

/// A timed effect attached to a participant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserEffect {
    pub source: ParticipantId,
    pub target: ParticipantId,
    /// Action that created the effect.
    pub origin: ContentRef,
    pub kind: EffectKind,
    /// Strength resolved when the effect was applied (AP for stuns, points or
    /// percent for stat adjustments, per-round amount for residuals).
    pub magnitude: f64,
    pub rounds: u32,
    pub created_round: u32,
}

impl UserEffect {
    pub fn tag(&self) -> EffectTag {
        self.kind.tag()
    }

    pub fn is_expired(&self) -> bool {
        self.rounds == 0
    }
}

/// A timed effect anchored to a battlefield tile.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroundEffect {
    pub source: ParticipantId,
    pub position: Position,
    pub origin: ContentRef,
    pub kind: EffectKind,
    /// Remaining barrier strength, or the per-round amount of a residual.
    pub magnitude: f64,
    pub rounds: u32,
    pub created_round: u32,
}

impl GroundEffect {
    pub fn tag(&self) -> EffectTag {
        self.kind.tag()
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, EffectKind::Barrier { .. })
    }

    pub fn is_expired(&self) -> bool {
        self.rounds == 0 || (self.is_barrier() && self.magnitude <= 0.0)
    }
}
