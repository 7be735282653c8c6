mod common;
mod effect;
mod participant;

pub use common::{BattleId, ParticipantId, Position, ResourceMeter, Team, Timestamp};
pub use effect::{GroundEffect, UserEffect};
pub use participant::{
    CombatStats, Controller, CooldownEntry, Element, General, GeneralRatings, LoadoutEntry,
    Participant, Pool, Pools, Style, StyleRatings,
};
