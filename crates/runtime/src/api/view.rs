//! Request and response types of the battle service.

use combat_core::{
    Battle, BattleAction, BattleId, BattleType, Battlefield, Conclusion, Initiative,
    ParticipantId, Position, Team,
};
use serde::Serialize;

/// Where and for whom a participant enters a battle. Stats, pools and
/// loadout come from the participant directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entrant {
    pub id: ParticipantId,
    pub team: Team,
    pub position: Position,
}

impl Entrant {
    pub fn new(id: ParticipantId, team: Team, position: Position) -> Self {
        Self { id, team, position }
    }
}

/// Everything needed to open a battle.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleSetup {
    pub id: BattleId,
    pub battle_type: BattleType,
    pub battlefield: Battlefield,
    pub entrants: Vec<Entrant>,
    pub reward_scaling: f64,
}

impl BattleSetup {
    pub fn new(id: BattleId, battle_type: BattleType, entrants: Vec<Entrant>) -> Self {
        Self {
            id,
            battle_type,
            battlefield: Battlefield::default(),
            entrants,
            reward_scaling: 1.0,
        }
    }

    pub fn with_battlefield(mut self, battlefield: Battlefield) -> Self {
        self.battlefield = battlefield;
        self
    }

    pub fn with_reward_scaling(mut self, reward_scaling: f64) -> Self {
        self.reward_scaling = reward_scaling;
        self
    }
}

/// Snapshot query result.
///
/// `version` is the token the next commit must present; `initiative` is the
/// clock evaluated at the caller's skew-corrected instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BattleView {
    pub battle: Battle,
    pub version: u64,
    pub initiative: Initiative,
}

/// A committed submission.
#[derive(Clone, Debug, PartialEq)]
pub struct Submitted {
    /// Snapshot as stored, carrying the committed version.
    pub battle: Battle,
    pub action: BattleAction,
    pub conclusion: Option<Conclusion>,
    /// Attempts spent, including the successful one.
    pub attempts: u32,
}

impl Submitted {
    pub fn version(&self) -> u64 {
        self.battle.version
    }
}
