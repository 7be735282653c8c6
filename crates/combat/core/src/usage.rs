//! Usage counter keys emitted when a battle concludes.

use crate::action::ContentType;
use crate::state::BattleType;

/// Terminal result for one participant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BattleOutcome {
    Win,
    Loss,
    Flee,
}

/// Counter key: (content type, content id, battle type, outcome).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsageKey {
    pub content_type: ContentType,
    pub content_id: String,
    pub battle_type: BattleType,
    pub outcome: BattleOutcome,
}

/// Increment for one counter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsageRecord {
    pub key: UsageKey,
    pub count: u64,
}
