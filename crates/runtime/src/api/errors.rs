//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the store, the resolver and external collaborators so
//! callers can bubble them up with consistent context.
use combat_core::{
    BattleId, BattleSetupError, CombatError, ErrorSeverity, ParticipantId, ResolveError,
};
use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Setup(#[from] BattleSetupError),

    #[error("{0} does not exist")]
    BattleNotFound(BattleId),

    #[error("participant {0} is unknown to the directory")]
    UnknownParticipant(ParticipantId),

    /// Every attempt lost the version race.
    #[error("battle state changed, please retry ({battle_id} conflicted {attempts} times)")]
    RefreshRequired { battle_id: BattleId, attempts: u32 },

    /// Stored state failed its integrity checks. The battle is now frozen.
    #[error("{battle_id} failed integrity checks and was frozen: {reason}")]
    IntegrityFailure { battle_id: BattleId, reason: String },

    #[error("runtime requires a {0} before building")]
    MissingComponent(&'static str),

    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },

    #[error("aggregation worker channel closed")]
    AggregationClosed,
}

impl CombatError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Repository(error) => error.severity(),
            Self::Resolve(error) => error.severity(),
            Self::Setup(error) => error.severity(),
            Self::BattleNotFound(_) | Self::UnknownParticipant(_) => ErrorSeverity::Validation,
            Self::RefreshRequired { .. } => ErrorSeverity::Recoverable,
            Self::IntegrityFailure { .. } => ErrorSeverity::Fatal,
            Self::MissingComponent(_) | Self::Collaborator { .. } | Self::AggregationClosed => {
                ErrorSeverity::Internal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Repository(error) => error.error_code(),
            Self::Resolve(error) => error.error_code(),
            Self::Setup(error) => error.error_code(),
            Self::BattleNotFound(_) => "BATTLE_NOT_FOUND",
            Self::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
            Self::RefreshRequired { .. } => "REFRESH_REQUIRED",
            Self::IntegrityFailure { .. } => "INTEGRITY_FAILURE",
            Self::MissingComponent(_) => "MISSING_COMPONENT",
            Self::Collaborator { .. } => "COLLABORATOR_FAILED",
            Self::AggregationClosed => "AGGREGATION_CLOSED",
        }
    }
}
