//! Error types for action resolution.

use crate::action::ContentRef;
use crate::effect::EffectError;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{ParticipantId, Position};

/// What a cost check ran out of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    ActionPoints,
    Health,
    Chakra,
    Stamina,
    Quantity,
}

/// Why a target was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TargetProblem {
    OffBattlefield,
    NoParticipant,
    WrongKind,
    Occupied,
    NoDirection,
}

/// A rejected action. Nothing was mutated; the same request will keep
/// failing until the snapshot or the request changes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationRejection {
    #[error("it is not {actor}'s turn (active: {active:?})")]
    NotYourTurn {
        actor: ParticipantId,
        active: Option<ParticipantId>,
    },

    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResource {
        resource: ResourceKind,
        required: u32,
        available: u32,
    },

    #[error("{action} cannot be used while the actor's bloodline is sealed")]
    Sealed { action: ContentRef },

    #[error("{action} is on cooldown for another {remaining_ms}ms")]
    OnCooldown { action: ContentRef, remaining_ms: i64 },

    #[error("target {target} is {distance} tiles away, range is {range}")]
    OutOfRange {
        target: Position,
        distance: u32,
        range: u32,
    },

    #[error("illegal target {target}: {problem}")]
    IllegalTarget {
        target: Position,
        problem: TargetProblem,
    },
}

impl CombatError for ValidationRejection {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotYourTurn { .. } => "NOT_YOUR_TURN",
            Self::InsufficientResource { .. } => "INSUFFICIENT_RESOURCE",
            Self::Sealed { .. } => "SEALED",
            Self::OnCooldown { .. } => "ON_COOLDOWN",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::IllegalTarget { .. } => "ILLEGAL_TARGET",
        }
    }
}

/// Errors surfaced by the action resolver.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Rejected(#[from] ValidationRejection),

    #[error("participant {0} is not part of the battle")]
    UnknownParticipant(ParticipantId),

    #[error("action {0} is not available to this participant")]
    UnknownAction(ContentRef),

    #[error("battle is {0} and accepts no actions")]
    NotWritable(crate::state::BattleStatus),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

impl CombatError for ResolveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Rejected(rejection) => rejection.severity(),
            Self::UnknownParticipant(_) | Self::UnknownAction(_) | Self::NotWritable(_) => {
                ErrorSeverity::Validation
            }
            Self::Effect(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.error_code(),
            Self::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
            Self::UnknownAction(_) => "UNKNOWN_ACTION",
            Self::NotWritable(_) => "NOT_WRITABLE",
            Self::Effect(error) => error.error_code(),
        }
    }
}
