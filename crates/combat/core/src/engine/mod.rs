//! Turn-level rules: who may act, whether an action is legal, and what it
//! does to the battle.
//!
//! [`clock`] derives initiative from a snapshot and the wall clock,
//! [`ActionResolver`] validates and applies one action against a snapshot,
//! and [`conclusion`] decides when a battle is over and how each participant
//! fared.

pub mod clock;
pub mod conclusion;
mod errors;
mod resolver;

pub use clock::{Initiative, UsableActionPoints, evaluate};
pub use conclusion::{Conclusion, detect};
pub use errors::{ResolveError, ResourceKind, TargetProblem, ValidationRejection};
pub use resolver::{ActionPlan, ActionRequest, ActionResolver, Resolution};
