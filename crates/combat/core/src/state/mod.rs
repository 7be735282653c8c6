//! The versioned battle aggregate.
//!
//! A [`Battle`] is the unit of persistence and of optimistic concurrency: the
//! store only accepts a new snapshot when the caller's expected version
//! matches the stored one. Nothing in this module touches the version; the
//! store owns that counter.

pub mod types;

pub use types::*;

use crate::config::EngineConfig;
use crate::error::{CombatError, ErrorSeverity};

/// Kind of battle. Controls effect stacking and is part of usage counter keys.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum BattleType {
    Arena,
    Combat,
    Sparring,
    KageAi,
    KagePvp,
    ClanChallenge,
    ClanBattle,
    Tournament,
    Quest,
    VillageProtector,
    Training,
}

impl BattleType {
    /// Whether same-tag effects on one target stack instead of replacing.
    ///
    /// Player-versus-environment battles stack; player-versus-player battles
    /// replace.
    pub const fn stacks_effects(self) -> bool {
        match self {
            BattleType::Arena
            | BattleType::KageAi
            | BattleType::Quest
            | BattleType::VillageProtector
            | BattleType::Training => true,
            BattleType::Combat
            | BattleType::Sparring
            | BattleType::KagePvp
            | BattleType::ClanChallenge
            | BattleType::ClanBattle
            | BattleType::Tournament => false,
        }
    }
}

/// Lifecycle of a stored battle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattleStatus {
    #[default]
    Ongoing,
    /// Archived after win, loss or flee.
    Concluded,
    /// Integrity failure detected; rejects all writes until inspected.
    Frozen,
}

/// Rectangular tile grid spanning `[0, width) x [0, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battlefield {
    pub width: u32,
    pub height: u32,
}

impl Battlefield {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both sides within `1..=MAX_BATTLEFIELD_SIDE`.
    pub fn is_valid(&self) -> bool {
        let sides = 1..=EngineConfig::MAX_BATTLEFIELD_SIDE;
        sides.contains(&self.width) && sides.contains(&self.height)
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    /// Every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new(
            EngineConfig::DEFAULT_BATTLEFIELD_WIDTH,
            EngineConfig::DEFAULT_BATTLEFIELD_HEIGHT,
        )
    }
}

/// Errors raised while assembling a new battle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleSetupError {
    #[error("a battle needs at least two participants, got {0}")]
    TooFewParticipants(usize),

    #[error("a battle accepts at most {max} participants, got {got}")]
    TooManyParticipants { got: usize, max: usize },

    #[error("participant {0} appears more than once")]
    DuplicateParticipant(ParticipantId),

    #[error("participant {id} starts outside the battlefield at {position}")]
    OutOfBounds { id: ParticipantId, position: Position },

    #[error("participants {first} and {second} share tile {position}")]
    SharedTile {
        first: ParticipantId,
        second: ParticipantId,
        position: Position,
    },

    #[error("all participants belong to one team")]
    SingleTeam,

    #[error("battlefield {width}x{height} must have sides between 1 and {max}")]
    Battlefield { width: u32, height: u32, max: u32 },
}

impl CombatError for BattleSetupError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TooFewParticipants(_) => "SETUP_TOO_FEW_PARTICIPANTS",
            Self::TooManyParticipants { .. } => "SETUP_TOO_MANY_PARTICIPANTS",
            Self::DuplicateParticipant(_) => "SETUP_DUPLICATE_PARTICIPANT",
            Self::OutOfBounds { .. } => "SETUP_OUT_OF_BOUNDS",
            Self::SharedTile { .. } => "SETUP_SHARED_TILE",
            Self::SingleTeam => "SETUP_SINGLE_TEAM",
            Self::Battlefield { .. } => "SETUP_BATTLEFIELD",
        }
    }
}

/// Stored battle content that breaks the model's invariants.
///
/// Raised for snapshots that decode cleanly but could never have been
/// produced by the resolver.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityViolation {
    #[error("round {0} is below 1")]
    Round(u32),

    #[error("version {0} is below 1")]
    Version(u64),

    #[error("battle has no participants")]
    NoParticipants,

    #[error("battlefield {width}x{height} is outside the supported size")]
    Battlefield { width: u32, height: u32 },

    #[error("participant {0} appears more than once")]
    DuplicateParticipant(ParticipantId),

    #[error("participant {id} stands outside the battlefield at {position}")]
    OutOfBounds { id: ParticipantId, position: Position },

    #[error("participants {first} and {second} both stand on {position}")]
    SharedTile {
        first: ParticipantId,
        second: ParticipantId,
        position: Position,
    },

    #[error("participant {id} holds {action_points} action points, maximum is {max}")]
    ActionPoints {
        id: ParticipantId,
        action_points: u32,
        max: u32,
    },

    #[error("participant {id} has {pool} above its maximum")]
    PoolOverflow { id: ParticipantId, pool: Pool },

    #[error("effect refers to unknown participant {0}")]
    UnknownEffectParticipant(ParticipantId),

    #[error("ground effect lies outside the battlefield at {0}")]
    GroundOutOfBounds(Position),

    #[error("effect magnitude is not a finite number")]
    NonFiniteMagnitude,

    #[error("active participant {0} is not in the battle")]
    UnknownActive(ParticipantId),
}

impl CombatError for IntegrityViolation {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        "INTEGRITY_VIOLATION"
    }
}

/// One ongoing fight.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battle {
    pub id: BattleId,
    pub battle_type: BattleType,
    pub status: BattleStatus,
    pub battlefield: Battlefield,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub round_start_at: Timestamp,
    pub users_state: Vec<Participant>,
    pub users_effects: Vec<UserEffect>,
    pub ground_effects: Vec<GroundEffect>,
    pub reward_scaling: f64,
    /// Starts at 1, never decreases.
    pub round: u32,
    /// Concurrency token. Starts at 1, bumped by exactly one per commit.
    pub version: u64,
    pub active_user_id: Option<ParticipantId>,
}

impl Battle {
    /// Assembles a fresh battle at round 1, version 1.
    pub fn new(
        id: BattleId,
        battle_type: BattleType,
        battlefield: Battlefield,
        participants: Vec<Participant>,
        now: Timestamp,
    ) -> Result<Self, BattleSetupError> {
        if participants.len() < 2 {
            return Err(BattleSetupError::TooFewParticipants(participants.len()));
        }
        if participants.len() > EngineConfig::MAX_PARTICIPANTS {
            return Err(BattleSetupError::TooManyParticipants {
                got: participants.len(),
                max: EngineConfig::MAX_PARTICIPANTS,
            });
        }
        if !battlefield.is_valid() {
            return Err(BattleSetupError::Battlefield {
                width: battlefield.width,
                height: battlefield.height,
                max: EngineConfig::MAX_BATTLEFIELD_SIDE,
            });
        }
        for (index, participant) in participants.iter().enumerate() {
            if !battlefield.contains(participant.position) {
                return Err(BattleSetupError::OutOfBounds {
                    id: participant.id,
                    position: participant.position,
                });
            }
            for other in &participants[..index] {
                if other.id == participant.id {
                    return Err(BattleSetupError::DuplicateParticipant(participant.id));
                }
                if other.position == participant.position {
                    return Err(BattleSetupError::SharedTile {
                        first: other.id,
                        second: participant.id,
                        position: participant.position,
                    });
                }
            }
        }
        let first_team = participants[0].team;
        if participants.iter().all(|p| p.team == first_team) {
            return Err(BattleSetupError::SingleTeam);
        }

        let active_user_id = participants.first().map(|p| p.id);
        Ok(Self {
            id,
            battle_type,
            status: BattleStatus::Ongoing,
            battlefield,
            created_at: now,
            updated_at: now,
            round_start_at: now,
            users_state: participants,
            users_effects: Vec::new(),
            ground_effects: Vec::new(),
            reward_scaling: 1.0,
            round: 1,
            version: 1,
            active_user_id,
        })
    }

    pub fn with_reward_scaling(mut self, reward_scaling: f64) -> Self {
        self.reward_scaling = reward_scaling;
        self
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.users_state.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.users_state.iter_mut().find(|p| p.id == id)
    }

    /// Standing participant on the tile, if any.
    pub fn occupant_at(&self, position: Position) -> Option<&Participant> {
        self.users_state
            .iter()
            .find(|p| p.position == position && p.is_standing())
    }

    pub fn barrier_at(&self, position: Position) -> Option<&GroundEffect> {
        self.ground_effects
            .iter()
            .find(|g| g.position == position && g.is_barrier() && !g.is_expired())
    }

    /// A tile with neither a standing participant nor a barrier.
    pub fn is_tile_free(&self, position: Position) -> bool {
        self.battlefield.contains(position)
            && self.occupant_at(position).is_none()
            && self.barrier_at(position).is_none()
    }

    /// Whether same-tag effects stack, honouring a configured override.
    pub fn stacking_enabled(&self, config: &EngineConfig) -> bool {
        config
            .stacking_override
            .unwrap_or_else(|| self.battle_type.stacks_effects())
    }

    pub fn is_writable(&self) -> bool {
        self.status == BattleStatus::Ongoing
    }

    /// Checks the invariants every resolved snapshot upholds.
    ///
    /// Run on snapshots read back from storage; a failure means the stored
    /// state must not be resolved against.
    pub fn check_integrity(&self, config: &EngineConfig) -> Result<(), IntegrityViolation> {
        if self.round < 1 {
            return Err(IntegrityViolation::Round(self.round));
        }
        if self.version < 1 {
            return Err(IntegrityViolation::Version(self.version));
        }
        if self.users_state.is_empty() {
            return Err(IntegrityViolation::NoParticipants);
        }
        if !self.battlefield.is_valid() {
            return Err(IntegrityViolation::Battlefield {
                width: self.battlefield.width,
                height: self.battlefield.height,
            });
        }

        let max = config.clock.max_action_points;
        for (index, participant) in self.users_state.iter().enumerate() {
            let id = participant.id;
            if !self.battlefield.contains(participant.position) {
                return Err(IntegrityViolation::OutOfBounds {
                    id,
                    position: participant.position,
                });
            }
            if participant.action_points > max {
                return Err(IntegrityViolation::ActionPoints {
                    id,
                    action_points: participant.action_points,
                    max,
                });
            }
            for pool in [Pool::Health, Pool::Chakra, Pool::Stamina] {
                let meter = participant.pools.get(pool);
                if meter.current > meter.maximum {
                    return Err(IntegrityViolation::PoolOverflow { id, pool });
                }
            }
            for other in &self.users_state[..index] {
                if other.id == id {
                    return Err(IntegrityViolation::DuplicateParticipant(id));
                }
                if other.position == participant.position
                    && other.is_standing()
                    && participant.is_standing()
                {
                    return Err(IntegrityViolation::SharedTile {
                        first: other.id,
                        second: id,
                        position: participant.position,
                    });
                }
            }
        }

        let known = |id: ParticipantId| self.participant(id).is_some();
        for effect in &self.users_effects {
            for id in [effect.source, effect.target] {
                if !known(id) {
                    return Err(IntegrityViolation::UnknownEffectParticipant(id));
                }
            }
            if !effect.magnitude.is_finite() {
                return Err(IntegrityViolation::NonFiniteMagnitude);
            }
        }
        for effect in &self.ground_effects {
            if !self.battlefield.contains(effect.position) {
                return Err(IntegrityViolation::GroundOutOfBounds(effect.position));
            }
            if !known(effect.source) {
                return Err(IntegrityViolation::UnknownEffectParticipant(effect.source));
            }
            if !effect.magnitude.is_finite() {
                return Err(IntegrityViolation::NonFiniteMagnitude);
            }
        }
        if let Some(active) = self.active_user_id
            && !known(active)
        {
            return Err(IntegrityViolation::UnknownActive(active));
        }
        Ok(())
    }
}

/// SHA-256 over the bincode encoding of the battle.
///
/// Stored alongside persisted snapshots; a mismatch on load means the
/// snapshot was corrupted or edited outside the engine.
#[cfg(feature = "serde")]
pub fn compute_state_digest(battle: &Battle) -> Result<[u8; 32], bincode::Error> {
    use sha2::{Digest, Sha256};

    let bytes = bincode::serialize(battle)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter(id: u32, team: u32, x: i32) -> Participant {
        Participant::new(ParticipantId(id), format!("p{id}"), Team(team), Position::new(x, 0))
    }

    #[test]
    fn new_battle_starts_at_round_one_version_one() {
        let battle = Battle::new(
            BattleId(7),
            BattleType::Arena,
            Battlefield::default(),
            vec![fighter(1, 1, 0), fighter(2, 2, 1)],
            Timestamp(5_000),
        )
        .expect("valid battle");

        assert_eq!(battle.round, 1);
        assert_eq!(battle.version, 1);
        assert_eq!(battle.round_start_at, Timestamp(5_000));
        assert_eq!(battle.active_user_id, Some(ParticipantId(1)));
        assert_eq!(battle.status, BattleStatus::Ongoing);
    }

    #[test]
    fn setup_rejects_shared_tiles_and_single_team() {
        let shared = Battle::new(
            BattleId(1),
            BattleType::Arena,
            Battlefield::default(),
            vec![fighter(1, 1, 0), fighter(2, 2, 0)],
            Timestamp(0),
        );
        assert!(matches!(shared, Err(BattleSetupError::SharedTile { .. })));

        let one_team = Battle::new(
            BattleId(1),
            BattleType::Arena,
            Battlefield::default(),
            vec![fighter(1, 1, 0), fighter(2, 1, 1)],
            Timestamp(0),
        );
        assert_eq!(one_team, Err(BattleSetupError::SingleTeam));
    }

    fn pair() -> Battle {
        Battle::new(
            BattleId(3),
            BattleType::Sparring,
            Battlefield::default(),
            vec![fighter(1, 1, 0), fighter(2, 2, 1)],
            Timestamp(0),
        )
        .expect("valid battle")
    }

    #[test]
    fn fresh_battles_pass_the_integrity_check() {
        assert_eq!(pair().check_integrity(&EngineConfig::default()), Ok(()));
    }

    #[test]
    fn integrity_check_catches_impossible_snapshots() {
        let config = EngineConfig::default();

        let mut overcharged = pair();
        overcharged.users_state[0].action_points = 500;
        assert_eq!(
            overcharged.check_integrity(&config),
            Err(IntegrityViolation::ActionPoints {
                id: ParticipantId(1),
                action_points: 500,
                max: 100,
            })
        );

        let mut round_zero = pair();
        round_zero.round = 0;
        assert_eq!(round_zero.check_integrity(&config), Err(IntegrityViolation::Round(0)));

        let mut cloned = pair();
        cloned.users_state[1].id = ParticipantId(1);
        assert_eq!(
            cloned.check_integrity(&config),
            Err(IntegrityViolation::DuplicateParticipant(ParticipantId(1)))
        );

        let mut stray = pair();
        stray.users_state[1].position = Position::new(-1, 0);
        assert!(matches!(
            stray.check_integrity(&config),
            Err(IntegrityViolation::OutOfBounds { .. })
        ));

        let mut haunted = pair();
        haunted.users_effects.push(UserEffect {
            source: ParticipantId(1),
            target: ParticipantId(42),
            origin: crate::action::ContentRef::basic("stun"),
            kind: crate::effect::EffectKind::Stun { power: 10 },
            magnitude: 10.0,
            rounds: 1,
            created_round: 1,
        });
        assert_eq!(
            haunted.check_integrity(&config),
            Err(IntegrityViolation::UnknownEffectParticipant(ParticipantId(42)))
        );
    }

    #[test]
    fn setup_rejects_out_of_bounds() {
        let result = Battle::new(
            BattleId(1),
            BattleType::Arena,
            Battlefield::new(2, 1),
            vec![fighter(1, 1, 0), fighter(2, 2, 5)],
            Timestamp(0),
        );
        assert!(matches!(result, Err(BattleSetupError::OutOfBounds { .. })));

        let vast = Battle::new(
            BattleId(1),
            BattleType::Arena,
            Battlefield::new(EngineConfig::MAX_BATTLEFIELD_SIDE + 1, 5),
            vec![fighter(1, 1, 0), fighter(2, 2, 1)],
            Timestamp(0),
        );
        assert!(matches!(vast, Err(BattleSetupError::Battlefield { .. })));
    }

    #[test]
    fn battle_type_round_trips_through_strum() {
        use std::str::FromStr;
        assert_eq!(BattleType::VillageProtector.to_string(), "VILLAGE_PROTECTOR");
        assert_eq!(BattleType::from_str("kage_pvp"), Ok(BattleType::KagePvp));
        assert!(BattleType::Training.stacks_effects());
        assert!(!BattleType::Tournament.stacks_effects());
    }

    #[test]
    fn stacking_override_wins_over_battle_type() {
        let battle = Battle::new(
            BattleId(1),
            BattleType::Tournament,
            Battlefield::default(),
            vec![fighter(1, 1, 0), fighter(2, 2, 1)],
            Timestamp(0),
        )
        .expect("valid battle");
        assert!(!battle.stacking_enabled(&EngineConfig::default()));
        let forced = EngineConfig::default().with_stacking_override(Some(true));
        assert!(battle.stacking_enabled(&forced));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn state_digest_changes_with_content() {
        let battle = Battle::new(
            BattleId(3),
            BattleType::Arena,
            Battlefield::default(),
            vec![fighter(1, 1, 0), fighter(2, 2, 1)],
            Timestamp(0),
        )
        .expect("valid battle");
        let digest = compute_state_digest(&battle).expect("digest");
        assert_eq!(hex::encode(digest).len(), 64);
        assert_eq!(compute_state_digest(&battle.clone()).expect("digest"), digest);

        let mut wounded = battle;
        wounded.users_state[1].pools.health.drain(1);
        assert_ne!(compute_state_digest(&wounded).expect("digest"), digest);
    }
}
