//! Action selection for AI-controlled participants.
//!
//! Selection runs in three steps:
//!
//! 1. **Candidates**: every usable action in the participant's loadout plus
//!    the basic moves, aimed at every tile within range
//!    ([`CandidateGenerator`]).
//! 2. **Simulation**: each candidate is resolved against the snapshot. The
//!    resolver is pure, so rejected candidates simply drop out and accepted
//!    ones yield the state they would produce.
//! 3. **Scoring**: a [`ActionPlanner`] scores the simulated states and the
//!    best candidate is submitted like any other action.
//!
//! Planning never writes. The chosen request goes through
//! [`BattleService::submit`](crate::BattleService::submit) and is validated
//! again against whatever state the store holds at commit time.

pub mod context;
pub mod generator;
pub mod planner;

pub use context::AiContext;
pub use generator::CandidateGenerator;
pub use planner::{ActionPlanner, FitnessPlanner};
