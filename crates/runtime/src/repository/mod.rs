//! Repository layer for battle data.
//!
//! Repositories hold data that CHANGES while battles run:
//! - Battle snapshots behind a version compare-and-swap
//! - Append-only action history and knockout pairings
//! - Usage counters fed by concluded battles
//!
//! Action definitions and tuning are static content and live in
//! `combat-content`, not here.

mod error;
mod file;
mod memory;
mod traits;
mod types;
mod usage;

pub use error::{RepositoryError, Result};
pub use file::{FileBattleStore, RecordLog};
pub use memory::InMemoryBattleStore;
pub use traits::{BattleRepository, BattleStore, HistoryRepository, UsageRepository};
pub use types::{CommitRecord, RoundHistory, group_by_round};
pub use usage::{FileUsageStore, InMemoryUsageStore, UsageQuery, UsageSummary};

#[cfg(test)]
pub(crate) mod testing {
    use combat_core::{
        Battle, BattleAction, BattleId, BattleType, Battlefield, Participant, ParticipantId,
        Position, Team, Timestamp,
    };

    use super::CommitRecord;

    pub fn battle(id: u64) -> Battle {
        Battle::new(
            BattleId(id),
            BattleType::Arena,
            Battlefield::default(),
            vec![
                Participant::new(ParticipantId(1), "Naruto", Team(1), Position::new(0, 0)),
                Participant::new(ParticipantId(2), "Sasuke", Team(2), Position::new(1, 0)),
            ],
            Timestamp(0),
        )
        .expect("valid battle")
    }

    pub fn record(description: &str) -> CommitRecord {
        CommitRecord::new(BattleAction {
            battle_id: BattleId(0),
            battle_version: 0,
            battle_round: 1,
            description: description.to_string(),
            applied_effects: Vec::new(),
            created_at: Timestamp(0),
        })
    }
}
