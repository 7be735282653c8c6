//! Action definitions and the content catalogue contract.
//!
//! Techniques, items and bloodline abilities are authored outside the engine
//! and looked up through [`ContentCatalogue`]. Basic moves (attack, heal,
//! move, flee, wait) are built into the engine; see [`basic`].

pub mod basic;
mod catalogue;
mod definition;

pub use catalogue::{ContentCatalogue, StaticCatalogue};
pub use definition::{ActionDefinition, ContentRef, ContentType, TargetKind, TargetMethod};
