//! Deterministic environment inputs consumed by the rules.
mod rng;

pub use rng::{PcgRng, RngOracle, compute_seed};
