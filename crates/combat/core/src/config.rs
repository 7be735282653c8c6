/// Battle engine constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Initiative clock tunables.
    pub clock: ClockConfig,
    /// Wall-clock length of one combat-time unit. Cooldowns are expressed in
    /// these units.
    pub combat_time_unit_ms: i64,
    /// Damage formula constants.
    pub damage: DamageConfig,
    /// Forces effect stacking on or off regardless of battle type.
    pub stacking_override: Option<bool>,
}

impl EngineConfig {
    // ===== compile-time constants =====
    /// Largest number of participants one battle accepts.
    pub const MAX_PARTICIPANTS: usize = 32;
    /// Battlefield width used when a battle is created without explicit bounds.
    pub const DEFAULT_BATTLEFIELD_WIDTH: u32 = 13;
    /// Battlefield height used when a battle is created without explicit bounds.
    pub const DEFAULT_BATTLEFIELD_HEIGHT: u32 = 5;
    /// Longest battlefield side. Also bounds action range and blast radius.
    pub const MAX_BATTLEFIELD_SIDE: u32 = 64;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_COMBAT_TIME_UNIT_MS: i64 = 10_000;

    pub fn new() -> Self {
        Self {
            clock: ClockConfig::default(),
            combat_time_unit_ms: Self::DEFAULT_COMBAT_TIME_UNIT_MS,
            damage: DamageConfig::default(),
            stacking_override: None,
        }
    }

    pub fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_combat_time_unit_ms(mut self, unit_ms: i64) -> Self {
        self.combat_time_unit_ms = unit_ms;
        self
    }

    pub fn with_damage(mut self, damage: DamageConfig) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_stacking_override(mut self, stacking: Option<bool>) -> Self {
        self.stacking_override = stacking;
        self
    }

    /// Wall-clock duration of a cooldown expressed in combat-time units.
    pub fn cooldown_ms(&self, cooldown_units: u32) -> i64 {
        i64::from(cooldown_units).saturating_mul(self.combat_time_unit_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Initiative clock tunables.
///
/// The depletion rate and the round ceiling are free parameters: both client
/// and server must evaluate the clock with the same values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClockConfig {
    /// Per-round time ceiling. The round advances once it has elapsed.
    pub round_duration_ms: i64,
    /// Action points drained per elapsed second since the round started.
    pub ap_depletion_per_second: f64,
    /// Cheapest action cost. A participant whose usable AP is below this
    /// value has finished acting for the round.
    pub min_action_cost: u32,
    /// Action points every standing participant holds after a round change.
    pub max_action_points: u32,
}

impl ClockConfig {
    pub const DEFAULT_ROUND_DURATION_MS: i64 = 40_000;
    pub const DEFAULT_AP_DEPLETION_PER_SECOND: f64 = 1.0;
    pub const DEFAULT_MIN_ACTION_COST: u32 = 30;
    pub const MAX_ACTION_POINTS: u32 = 100;

    pub fn new() -> Self {
        Self {
            round_duration_ms: Self::DEFAULT_ROUND_DURATION_MS,
            ap_depletion_per_second: Self::DEFAULT_AP_DEPLETION_PER_SECOND,
            min_action_cost: Self::DEFAULT_MIN_ACTION_COST,
            max_action_points: Self::MAX_ACTION_POINTS,
        }
    }

    pub fn with_round_duration_ms(mut self, round_duration_ms: i64) -> Self {
        self.round_duration_ms = round_duration_ms;
        self
    }

    pub fn with_ap_depletion_per_second(mut self, rate: f64) -> Self {
        self.ap_depletion_per_second = rate;
        self
    }

    pub fn with_min_action_cost(mut self, min_action_cost: u32) -> Self {
        self.min_action_cost = min_action_cost;
        self
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Constants of the stat-pairing damage formula.
///
/// `effect = base + atk^atk_scaling / def^def_scaling * exp^exp_scaling`,
/// then `damage = (1 + power * power_scaling) * effect * damage_scaling + base`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageConfig {
    pub base: f64,
    pub atk_scaling: f64,
    pub def_scaling: f64,
    pub exp_scaling: f64,
    pub gen_scaling: f64,
    pub power_scaling: f64,
    pub damage_scaling: f64,
    /// Multiplier when the attacking element beats the defender's affinity.
    pub strong_element_multiplier: f64,
    /// Multiplier when the defender's affinity beats the attacking element.
    pub weak_element_multiplier: f64,
}

impl DamageConfig {
    pub fn new() -> Self {
        Self {
            base: 10.0,
            atk_scaling: 0.9,
            def_scaling: 0.8,
            exp_scaling: 0.1,
            gen_scaling: 0.5,
            power_scaling: 0.05,
            damage_scaling: 1.0,
            strong_element_multiplier: 1.2,
            weak_element_multiplier: 0.8,
        }
    }
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self::new()
    }
}
