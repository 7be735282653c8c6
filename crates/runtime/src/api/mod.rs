//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or storage.

pub mod directory;
pub mod errors;
pub mod view;

pub use directory::{
    CombatStatus, InMemoryDirectory, OutcomeConsumer, ParticipantDirectory, RecordedOutcomes,
};
pub use errors::{Result, RuntimeError};
pub use view::{BattleSetup, BattleView, Entrant, Submitted};
