//! Battle conclusion detection and usage counter emission.

use crate::action::{ContentRef, ContentType};
use crate::state::{Battle, Controller, ParticipantId, Team};
use crate::usage::{BattleOutcome, UsageKey, UsageRecord};

/// Terminal result of a battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conclusion {
    /// Winning team, `None` when nobody is left standing.
    pub winner: Option<Team>,
    pub outcomes: Vec<(ParticipantId, BattleOutcome)>,
    pub reward_scaling: f64,
    /// One increment per distinct usage counter key.
    pub usage: Vec<UsageRecord>,
}

impl Conclusion {
    pub fn outcome_of(&self, id: ParticipantId) -> Option<BattleOutcome> {
        self.outcomes
            .iter()
            .find(|(participant, _)| *participant == id)
            .map(|(_, outcome)| *outcome)
    }
}

/// Returns the conclusion once at most one team has participants standing.
pub fn detect(battle: &Battle) -> Option<Conclusion> {
    let mut standing_teams: Vec<Team> = battle
        .users_state
        .iter()
        .filter(|p| p.is_standing())
        .map(|p| p.team)
        .collect();
    standing_teams.sort();
    standing_teams.dedup();
    if standing_teams.len() > 1 {
        return None;
    }
    let winner = standing_teams.first().copied();

    let outcomes: Vec<(ParticipantId, BattleOutcome)> = battle
        .users_state
        .iter()
        .map(|p| {
            let outcome = if p.fled {
                BattleOutcome::Flee
            } else if Some(p.team) == winner {
                BattleOutcome::Win
            } else {
                BattleOutcome::Loss
            };
            (p.id, outcome)
        })
        .collect();

    let mut usage: Vec<UsageRecord> = Vec::new();
    for (participant, (_, outcome)) in battle.users_state.iter().zip(&outcomes) {
        if participant.controller == Controller::Ai {
            let ai = ContentRef::new(ContentType::Ai, participant.name.clone());
            bump(&mut usage, battle, &ai, *outcome);
        }
        for action in &participant.used_actions {
            bump(&mut usage, battle, action, *outcome);
        }
    }

    Some(Conclusion {
        winner,
        outcomes,
        reward_scaling: battle.reward_scaling,
        usage,
    })
}

fn bump(usage: &mut Vec<UsageRecord>, battle: &Battle, action: &ContentRef, outcome: BattleOutcome) {
    let key = UsageKey {
        content_type: action.content_type,
        content_id: action.id.clone(),
        battle_type: battle.battle_type,
        outcome,
    };
    match usage.iter_mut().find(|record| record.key == key) {
        Some(record) => record.count += 1,
        None => usage.push(UsageRecord { key, count: 1 }),
    }
}
