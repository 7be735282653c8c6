//! Runtime orchestration for battle resolution.
//!
//! This crate wires the pure rules of `combat-core` to storage, clocks and
//! the systems around a battle. Consumers build a [`BattleService`] to open
//! battles, submit actions under optimistic concurrency, read history, and
//! subscribe to battle events.
//!
//! Modules are organized by responsibility:
//! - [`service`] hosts the orchestrator and builder
//! - [`ai`] picks actions for AI-controlled participants
//! - [`api`] exposes the types and collaborator contracts clients use
//! - [`events`] provides the broadcast event stream
//! - [`repository`] provides the battle, history and usage stores
//! - [`workers`] keeps background tasks internal to the crate
pub mod ai;
pub mod api;
pub mod clock;
pub mod config;
pub mod events;
pub mod repository;
pub mod service;

mod workers;

pub use ai::{ActionPlanner, AiContext, CandidateGenerator, FitnessPlanner};
pub use api::{
    BattleSetup, BattleView, CombatStatus, Entrant, InMemoryDirectory, OutcomeConsumer,
    ParticipantDirectory, RecordedOutcomes, Result, RuntimeError, Submitted,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RuntimeConfig, default_data_dir};
pub use events::{BattleEvent, EventBus};
pub use repository::{
    BattleRepository, BattleStore, CommitRecord, FileBattleStore, FileUsageStore,
    HistoryRepository, InMemoryBattleStore, InMemoryUsageStore, RepositoryError, RoundHistory,
    UsageQuery, UsageRepository, UsageSummary,
};
pub use service::{BattleService, BattleServiceBuilder};
pub use workers::AggregationHandle;
