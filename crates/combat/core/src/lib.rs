//! Deterministic battle rules shared by every battle service.
//!
//! `combat-core` defines the canonical battle aggregate, the tile geometry used
//! for area-of-effect targeting, the effect engine, the initiative clock and
//! the action resolver. Everything here is pure: the wall clock is always an
//! explicit input, so the same snapshot evaluated on a client and a server
//! yields identical results.
pub mod action;
pub mod config;
pub mod effect;
pub mod engine;
pub mod env;
pub mod error;
pub mod geometry;
pub mod history;
pub mod state;
pub mod usage;

pub use action::{
    ActionDefinition, ContentCatalogue, ContentRef, ContentType, StaticCatalogue, TargetKind,
    TargetMethod,
};
pub use config::{ClockConfig, DamageConfig, EngineConfig};
pub use effect::{
    Calculation, DamageSpec, EffectDescriptor, EffectKind, EffectTag, EffectTarget, HealSpec,
    ResidualPayload,
};
pub use engine::{
    ActionRequest, ActionResolver, Conclusion, Initiative, Resolution, ResolveError,
    ValidationRejection,
};
pub use error::{CombatError, ErrorSeverity};
pub use geometry::{Direction, Targeting};
pub use history::{AppliedEffect, BattleAction, BattleHistory, LineColor};
pub use state::{
    Battle, BattleId, BattleSetupError, BattleStatus, BattleType, Battlefield, CombatStats,
    Controller, Element, General, GroundEffect, IntegrityViolation, LoadoutEntry, Participant,
    ParticipantId, Pool, Pools, Position, ResourceMeter, Style, Team, Timestamp, UserEffect,
};
pub use usage::{BattleOutcome, UsageKey, UsageRecord};
