//! Contracts with the systems around a battle.
//!
//! The engine reads participant seeds from a [`ParticipantDirectory`] when a
//! battle opens and writes back only final pools and a coarse status. The
//! terminal result goes to an [`OutcomeConsumer`], which owns rewards and
//! progression.
use std::collections::HashMap;

use async_trait::async_trait;
use combat_core::{Battle, BattleId, BattleOutcome, Conclusion, Participant, ParticipantId, Pools};
use tokio::sync::RwLock;

use super::errors::Result;

/// Coarse status written back to the directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatStatus {
    EnteredCombat,
    LeftCombat { outcome: BattleOutcome },
    /// Knocked out when the battle ended.
    Hospitalized,
}

/// Source of participant seeds and sink of status write-backs.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Seed snapshot (name, stats, pools, loadout, controller). Team and
    /// position are assigned by the battle setup.
    async fn seed(&self, id: ParticipantId) -> Result<Option<Participant>>;

    /// Records a status transition, with final pools when leaving combat.
    async fn update_status(
        &self,
        id: ParticipantId,
        status: CombatStatus,
        pools: Option<Pools>,
    ) -> Result<()>;
}

/// Receives terminal outcomes for reward settlement.
#[async_trait]
pub trait OutcomeConsumer: Send + Sync {
    async fn settle(&self, battle: &Battle, conclusion: &Conclusion) -> Result<()>;
}

/// Directory backed by a map, remembering every write-back.
#[derive(Default)]
pub struct InMemoryDirectory {
    seeds: RwLock<HashMap<ParticipantId, Participant>>,
    statuses: RwLock<Vec<(ParticipantId, CombatStatus, Option<Pools>)>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participants(participants: impl IntoIterator<Item = Participant>) -> Self {
        Self {
            seeds: RwLock::new(participants.into_iter().map(|p| (p.id, p)).collect()),
            statuses: RwLock::default(),
        }
    }

    pub async fn insert(&self, participant: Participant) {
        self.seeds.write().await.insert(participant.id, participant);
    }

    /// Write-backs in the order they arrived.
    pub async fn statuses(&self) -> Vec<(ParticipantId, CombatStatus, Option<Pools>)> {
        self.statuses.read().await.clone()
    }

    /// Latest status written for `id`.
    pub async fn status_of(&self, id: ParticipantId) -> Option<CombatStatus> {
        self.statuses
            .read()
            .await
            .iter()
            .rev()
            .find(|(participant, _, _)| *participant == id)
            .map(|(_, status, _)| *status)
    }
}

#[async_trait]
impl ParticipantDirectory for InMemoryDirectory {
    async fn seed(&self, id: ParticipantId) -> Result<Option<Participant>> {
        Ok(self.seeds.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: ParticipantId,
        status: CombatStatus,
        pools: Option<Pools>,
    ) -> Result<()> {
        if let Some(pools) = pools {
            let mut seeds = self.seeds.write().await;
            if let Some(seed) = seeds.get_mut(&id) {
                seed.pools = pools;
            }
        }
        self.statuses.write().await.push((id, status, pools));
        Ok(())
    }
}

/// Outcome consumer that keeps every settlement in memory.
#[derive(Default)]
pub struct RecordedOutcomes {
    settled: RwLock<Vec<(BattleId, Conclusion)>>,
}

impl RecordedOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn settled(&self) -> Vec<(BattleId, Conclusion)> {
        self.settled.read().await.clone()
    }
}

#[async_trait]
impl OutcomeConsumer for RecordedOutcomes {
    async fn settle(&self, battle: &Battle, conclusion: &Conclusion) -> Result<()> {
        tracing::debug!(
            battle = %battle.id,
            winner = ?conclusion.winner,
            reward_scaling = conclusion.reward_scaling,
            "settling outcome"
        );
        self.settled
            .write()
            .await
            .push((battle.id, conclusion.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{Position, Team};

    #[tokio::test]
    async fn write_back_updates_seed_pools() {
        let seed = Participant::new(ParticipantId(1), "Lee", Team(1), Position::new(0, 0));
        let directory = InMemoryDirectory::with_participants([seed]);

        let mut pools = Pools::full(100, 100, 100);
        pools.health.current = 40;
        directory
            .update_status(
                ParticipantId(1),
                CombatStatus::LeftCombat {
                    outcome: BattleOutcome::Win,
                },
                Some(pools),
            )
            .await
            .expect("update");

        let reloaded = directory
            .seed(ParticipantId(1))
            .await
            .expect("seed")
            .expect("present");
        assert_eq!(reloaded.pools.health.current, 40);
        assert_eq!(
            directory.status_of(ParticipantId(1)).await,
            Some(CombatStatus::LeftCombat {
                outcome: BattleOutcome::Win
            })
        );
        assert!(directory.seed(ParticipantId(9)).await.expect("seed").is_none());
    }
}
