//! Common error infrastructure for combat-core.
//!
//! Domain-specific errors (e.g. [`crate::engine::ValidationRejection`]) are
//! defined next to the operations that produce them. This module holds the
//! shared severity classification every error in the crate reports.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same request may succeed after re-reading state
/// - **Validation**: the request was rejected and must change before resubmission
/// - **Internal**: unexpected inconsistency that should be investigated
/// - **Fatal**: stored state is corrupted and the battle cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Stale snapshot or transient condition; re-fetch and retry.
    Recoverable,

    /// Invalid request; no state was mutated.
    ///
    /// Examples: insufficient action points, target out of range
    Validation,

    /// Unexpected state inconsistency.
    Internal,

    /// Corrupted battle state. The battle must be frozen.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug or corruption.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
