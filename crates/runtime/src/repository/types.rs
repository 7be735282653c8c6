//! Records written alongside a committed snapshot.

use combat_core::{BattleAction, BattleHistory};

/// Everything a commit appends besides the snapshot itself.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommitRecord {
    /// The single history row of the transition. The store overwrites its
    /// `battle_id` and `battle_version` with the committed values.
    pub action: BattleAction,
    /// Knockout pairings recorded by the transition.
    pub knockouts: Vec<BattleHistory>,
}

impl CommitRecord {
    pub fn new(action: BattleAction) -> Self {
        Self {
            action,
            knockouts: Vec::new(),
        }
    }

    pub fn with_knockouts(mut self, knockouts: Vec<BattleHistory>) -> Self {
        self.knockouts = knockouts;
        self
    }
}

/// History rows of one round, in version order.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundHistory {
    pub round: u32,
    pub actions: Vec<BattleAction>,
}

/// Groups version-ordered rows by the round they were committed in.
pub fn group_by_round(actions: Vec<BattleAction>) -> Vec<RoundHistory> {
    let mut rounds: Vec<RoundHistory> = Vec::new();
    for action in actions {
        match rounds.last_mut() {
            Some(current) if current.round == action.battle_round => current.actions.push(action),
            _ => rounds.push(RoundHistory {
                round: action.battle_round,
                actions: vec![action],
            }),
        }
    }
    rounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{BattleId, Timestamp};

    fn row(version: u64, round: u32) -> BattleAction {
        BattleAction {
            battle_id: BattleId(1),
            battle_version: version,
            battle_round: round,
            description: format!("v{version}"),
            applied_effects: Vec::new(),
            created_at: Timestamp(0),
        }
    }

    #[test]
    fn rows_group_by_consecutive_round() {
        let grouped = group_by_round(vec![row(2, 1), row(3, 1), row(4, 2), row(5, 3), row(6, 3)]);
        let shape: Vec<(u32, usize)> = grouped.iter().map(|r| (r.round, r.actions.len())).collect();
        assert_eq!(shape, vec![(1, 2), (2, 1), (3, 2)]);
    }
}
