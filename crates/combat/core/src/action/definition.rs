use std::fmt;

use crate::effect::EffectDescriptor;
use crate::state::Pool;

/// Category of authored content. Part of usage counter keys.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContentType {
    Jutsu,
    Item,
    Bloodline,
    Basic,
    Ai,
}

/// Reference to an action definition: content category plus content id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentRef {
    pub content_type: ContentType,
    pub id: String,
}

impl ContentRef {
    pub fn new(content_type: ContentType, id: impl Into<String>) -> Self {
        Self {
            content_type,
            id: id.into(),
        }
    }

    pub fn basic(id: impl Into<String>) -> Self {
        Self::new(ContentType::Basic, id)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_type, self.id)
    }
}

/// Who or what an action may be aimed at.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TargetKind {
    /// The caster only.
    #[strum(serialize = "SELF")]
    SelfTarget,
    /// Any participant other than the caster.
    OtherUser,
    /// A participant on another team.
    Opponent,
    /// A participant on the caster's team, caster included.
    Ally,
    /// Any participant.
    Character,
    /// Any tile.
    Ground,
    /// A tile with no standing participant and no barrier.
    EmptyGround,
}

impl TargetKind {
    pub fn targets_participants(self) -> bool {
        !matches!(self, TargetKind::Ground | TargetKind::EmptyGround)
    }
}

/// Shape of the tile set an action resolves to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TargetMethod {
    Single,
    All,
    AoeCircleSpawn,
    AoeLineShoot,
    AoeWallShoot,
    AoeCircleShoot,
    AoeSpiralShoot,
}

/// A technique, item or basic move.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDefinition {
    pub id: String,
    pub content_type: ContentType,
    pub name: String,
    /// Log line template with `%user`, `%target` and `%location` placeholders.
    pub description: String,
    pub target: TargetKind,
    pub method: TargetMethod,
    pub range: u32,
    /// Radius of circle and half-length of wall shapes.
    #[cfg_attr(feature = "serde", serde(default = "default_blast_radius"))]
    pub blast_radius: u32,
    /// Cooldown in combat-time units.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub action_cost_perc: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub health_cost_perc: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub chakra_cost_perc: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stamina_cost_perc: f64,
    /// Drains whatever action points remain after the cost.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ends_turn: bool,
    /// May be used while another participant holds the initiative.
    #[cfg_attr(feature = "serde", serde(default))]
    pub off_turn: bool,
    pub effects: Vec<EffectDescriptor>,
}

#[cfg(feature = "serde")]
fn default_blast_radius() -> u32 {
    1
}

impl ActionDefinition {
    pub fn new(
        content_type: ContentType,
        id: impl Into<String>,
        name: impl Into<String>,
        target: TargetKind,
        method: TargetMethod,
        range: u32,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            content_type,
            description: format!("%user uses {name} on %target"),
            name,
            target,
            method,
            range,
            blast_radius: 1,
            cooldown: 0,
            action_cost_perc: 0.0,
            health_cost_perc: 0.0,
            chakra_cost_perc: 0.0,
            stamina_cost_perc: 0.0,
            ends_turn: false,
            off_turn: false,
            effects: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_action_cost(mut self, perc: f64) -> Self {
        self.action_cost_perc = perc;
        self
    }

    pub fn with_pool_cost(mut self, pool: Pool, perc: f64) -> Self {
        match pool {
            Pool::Health => self.health_cost_perc = perc,
            Pool::Chakra => self.chakra_cost_perc = perc,
            Pool::Stamina => self.stamina_cost_perc = perc,
        }
        self
    }

    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_blast_radius(mut self, blast_radius: u32) -> Self {
        self.blast_radius = blast_radius;
        self
    }

    pub fn with_effect(mut self, effect: EffectDescriptor) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn reference(&self) -> ContentRef {
        ContentRef::new(self.content_type, self.id.clone())
    }

    pub fn pool_cost_perc(&self, pool: Pool) -> f64 {
        match pool {
            Pool::Health => self.health_cost_perc,
            Pool::Chakra => self.chakra_cost_perc,
            Pool::Stamina => self.stamina_cost_perc,
        }
    }
}
