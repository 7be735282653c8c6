//! Deterministic chance rolls.
//!
//! Chance-based effects (fleeing) roll against a seed derived from the
//! battle snapshot, so re-validating a transition from the same snapshot
//! reproduces the same outcome.

/// Seeded random source. Same seed, same value.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// True with probability `percent`/100. Values of 100 or more always succeed.
    fn chance(&self, seed: u64, percent: u32) -> bool {
        percent >= 100 || self.roll_d100(seed) <= percent
    }
}

/// PCG-XSH-RR: 64-bit LCG state, 32-bit permuted output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Seed for one roll inside one transition.
///
/// * `battle_id` - the battle being resolved
/// * `version` - snapshot version the transition starts from
/// * `actor` - participant performing the action
/// * `context` - distinguishes several rolls in one transition (effect index)
pub fn compute_seed(battle_id: u64, version: u64, actor: u32, context: u32) -> u64 {
    let mut hash = battle_id;
    hash ^= version.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(actor).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    // avalanche
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
