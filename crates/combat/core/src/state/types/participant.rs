//! Per-participant battle snapshot.

use super::common::{ParticipantId, Position, ResourceMeter, Team, Timestamp};
use crate::action::ContentRef;

/// Who submits actions for the participant.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Controller {
    #[default]
    Human,
    Ai,
}

/// Fighting style. Each style has an offence and a defence rating.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Style {
    Ninjutsu,
    Genjutsu,
    Taijutsu,
    Bukijutsu,
}

/// General attributes paired between attacker and defender.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum General {
    Strength,
    Intelligence,
    Willpower,
    Speed,
}

/// Elemental nature. Each element beats the next one on the wheel
/// Fire → Wind → Lightning → Earth → Water → Fire.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Element {
    Fire,
    Wind,
    Lightning,
    Earth,
    Water,
}

impl Element {
    /// The element this one is strong against.
    pub const fn beats(self) -> Element {
        match self {
            Element::Fire => Element::Wind,
            Element::Wind => Element::Lightning,
            Element::Lightning => Element::Earth,
            Element::Earth => Element::Water,
            Element::Water => Element::Fire,
        }
    }
}

/// Rating per fighting style.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleRatings {
    pub ninjutsu: f64,
    pub genjutsu: f64,
    pub taijutsu: f64,
    pub bukijutsu: f64,
}

impl StyleRatings {
    pub fn uniform(value: f64) -> Self {
        Self {
            ninjutsu: value,
            genjutsu: value,
            taijutsu: value,
            bukijutsu: value,
        }
    }

    pub fn get(&self, style: Style) -> f64 {
        match style {
            Style::Ninjutsu => self.ninjutsu,
            Style::Genjutsu => self.genjutsu,
            Style::Taijutsu => self.taijutsu,
            Style::Bukijutsu => self.bukijutsu,
        }
    }
}

/// Rating per general attribute.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneralRatings {
    pub strength: f64,
    pub intelligence: f64,
    pub willpower: f64,
    pub speed: f64,
}

impl GeneralRatings {
    pub fn uniform(value: f64) -> Self {
        Self {
            strength: value,
            intelligence: value,
            willpower: value,
            speed: value,
        }
    }

    pub fn get(&self, general: General) -> f64 {
        match general {
            General::Strength => self.strength,
            General::Intelligence => self.intelligence,
            General::Willpower => self.willpower,
            General::Speed => self.speed,
        }
    }
}

/// Seed stats supplied by the participant directory at battle start.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub offence: StyleRatings,
    pub defence: StyleRatings,
    pub generals: GeneralRatings,
    pub experience: f64,
    /// Elemental affinities; the first one is used for defence.
    pub elements: Vec<Element>,
}

impl CombatStats {
    pub fn uniform(rating: f64, experience: f64) -> Self {
        Self {
            offence: StyleRatings::uniform(rating),
            defence: StyleRatings::uniform(rating),
            generals: GeneralRatings::uniform(rating),
            experience,
            elements: Vec::new(),
        }
    }
}

/// Pools that action costs draw from.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Pool {
    Health,
    Chakra,
    Stamina,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pools {
    pub health: ResourceMeter,
    pub chakra: ResourceMeter,
    pub stamina: ResourceMeter,
}

impl Pools {
    pub fn full(health: u32, chakra: u32, stamina: u32) -> Self {
        Self {
            health: ResourceMeter::full(health),
            chakra: ResourceMeter::full(chakra),
            stamina: ResourceMeter::full(stamina),
        }
    }

    pub fn get(&self, pool: Pool) -> &ResourceMeter {
        match pool {
            Pool::Health => &self.health,
            Pool::Chakra => &self.chakra,
            Pool::Stamina => &self.stamina,
        }
    }

    pub fn get_mut(&mut self, pool: Pool) -> &mut ResourceMeter {
        match pool {
            Pool::Health => &mut self.health,
            Pool::Chakra => &mut self.chakra,
            Pool::Stamina => &mut self.stamina,
        }
    }
}

/// An action the participant brought into battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadoutEntry {
    pub action: ContentRef,
    /// Remaining uses for consumables; `None` means unlimited.
    pub quantity: Option<u32>,
}

impl LoadoutEntry {
    pub fn unlimited(action: ContentRef) -> Self {
        Self {
            action,
            quantity: None,
        }
    }

    pub fn consumable(action: ContentRef, quantity: u32) -> Self {
        Self {
            action,
            quantity: Some(quantity),
        }
    }
}

/// Last time an action was used, for cooldown checks.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownEntry {
    pub action: ContentRef,
    pub used_at: Timestamp,
}

/// One participant's snapshot inside the battle aggregate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub team: Team,
    pub controller: Controller,
    pub position: Position,
    pub pools: Pools,
    /// Stored action points. Usable AP is derived by the initiative clock.
    pub action_points: u32,
    pub stats: CombatStats,
    pub loadout: Vec<LoadoutEntry>,
    pub cooldowns: Vec<CooldownEntry>,
    /// Every action used this battle, in order; consumed by usage counters.
    pub used_actions: Vec<ContentRef>,
    pub fled: bool,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, team: Team, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            team,
            controller: Controller::Human,
            position,
            pools: Pools::full(100, 100, 100),
            action_points: 100,
            stats: CombatStats::uniform(10.0, 100.0),
            loadout: Vec::new(),
            cooldowns: Vec::new(),
            used_actions: Vec::new(),
            fled: false,
        }
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_pools(mut self, pools: Pools) -> Self {
        self.pools = pools;
        self
    }

    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_loadout(mut self, loadout: Vec<LoadoutEntry>) -> Self {
        self.loadout = loadout;
        self
    }

    /// Alive and still on the battlefield.
    pub fn is_standing(&self) -> bool {
        !self.pools.health.is_depleted() && !self.fled
    }

    pub fn is_knocked_out(&self) -> bool {
        self.pools.health.is_depleted()
    }

    pub fn loadout_entry(&self, action: &ContentRef) -> Option<&LoadoutEntry> {
        self.loadout.iter().find(|entry| &entry.action == action)
    }

    pub fn loadout_entry_mut(&mut self, action: &ContentRef) -> Option<&mut LoadoutEntry> {
        self.loadout.iter_mut().find(|entry| &entry.action == action)
    }

    pub fn last_used(&self, action: &ContentRef) -> Option<Timestamp> {
        self.cooldowns
            .iter()
            .find(|entry| &entry.action == action)
            .map(|entry| entry.used_at)
    }

    pub fn record_use(&mut self, action: &ContentRef, now: Timestamp) {
        match self.cooldowns.iter_mut().find(|entry| &entry.action == action) {
            Some(entry) => entry.used_at = now,
            None => self.cooldowns.push(CooldownEntry {
                action: action.clone(),
                used_at: now,
            }),
        }
        self.used_actions.push(action.clone());
    }
}
