//! Error types raised by repository implementations.

use combat_core::{BattleId, BattleStatus, CombatError, ErrorSeverity};
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("battle repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0} does not exist")]
    NotFound(BattleId),

    #[error("{0} already exists")]
    AlreadyExists(BattleId),

    /// Stale write. The caller must re-fetch and recompute.
    #[error("{battle_id} is at version {actual}, commit expected {expected}")]
    VersionConflict {
        battle_id: BattleId,
        expected: u64,
        actual: u64,
    },

    #[error("{battle_id} is {status} and accepts no commits")]
    NotWritable {
        battle_id: BattleId,
        status: BattleStatus,
    },

    #[error("commit for {battle_id} carries a snapshot of {found}")]
    MismatchedBattle { battle_id: BattleId, found: BattleId },

    #[error("partial write detected at offset {offset}: expected {expected} bytes, found {actual}")]
    PartialWrite {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// Stored bytes failed to decode or did not match their digest.
    #[error("{battle_id} is corrupted: {reason}")]
    Corrupted { battle_id: BattleId, reason: String },
}

impl CombatError for RepositoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::VersionConflict { .. } => ErrorSeverity::Recoverable,
            Self::NotFound(_)
            | Self::AlreadyExists(_)
            | Self::NotWritable { .. }
            | Self::MismatchedBattle { .. } => ErrorSeverity::Validation,
            Self::LockPoisoned | Self::Io(_) | Self::Serialization(_) => ErrorSeverity::Internal,
            Self::PartialWrite { .. } | Self::Corrupted { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::LockPoisoned => "REPOSITORY_LOCK_POISONED",
            Self::Io(_) => "REPOSITORY_IO",
            Self::Serialization(_) => "REPOSITORY_SERIALIZATION",
            Self::NotFound(_) => "BATTLE_NOT_FOUND",
            Self::AlreadyExists(_) => "BATTLE_ALREADY_EXISTS",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::NotWritable { .. } => "BATTLE_NOT_WRITABLE",
            Self::MismatchedBattle { .. } => "MISMATCHED_BATTLE",
            Self::PartialWrite { .. } => "REPOSITORY_PARTIAL_WRITE",
            Self::Corrupted { .. } => "INTEGRITY_FAILURE",
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
