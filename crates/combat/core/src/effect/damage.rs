//! Damage and heal magnitudes.
//!
//! Static and percentage calculations are flat. The formula calculation
//! pairs the caster's offence against the target's defence for the listed
//! styles, scales by shared experience and, when general attributes are
//! listed, by the ratio of the general ratings. Active stat adjustments on
//! either side are folded into the ratings first.

use super::{Calculation, DamageSpec, EffectKind, HealSpec};
use crate::config::DamageConfig;
use crate::state::{Element, General, Participant, Style, UserEffect};

/// A rating that stat adjustments can modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stat {
    Offence(Style),
    Defence(Style),
    General(General),
}

impl Stat {
    fn base(self, participant: &Participant) -> f64 {
        match self {
            Stat::Offence(style) => participant.stats.offence.get(style),
            Stat::Defence(style) => participant.stats.defence.get(style),
            Stat::General(general) => participant.stats.generals.get(general),
        }
    }
}

/// Rating after active stat adjustments, never below 1.
pub fn effective_rating(participant: &Participant, stat: Stat, effects: &[UserEffect]) -> f64 {
    let base = stat.base(participant);
    let mut flat = 0.0;
    let mut percent = 0.0;
    for effect in effects.iter().filter(|e| e.target == participant.id) {
        if let EffectKind::StatAdjust {
            calculation,
            styles,
            generals,
            ..
        } = &effect.kind
        {
            let applies = match stat {
                Stat::Offence(style) | Stat::Defence(style) => styles.contains(&style),
                Stat::General(general) => generals.contains(&general),
            };
            if !applies {
                continue;
            }
            match calculation {
                Calculation::Static => flat += effect.magnitude,
                Calculation::Percentage | Calculation::Formula => percent += effect.magnitude,
            }
        }
    }
    (base + flat + base * percent / 100.0).max(1.0)
}

fn average(participant: &Participant, stats: impl Iterator<Item = Stat>, effects: &[UserEffect]) -> f64 {
    let mut total = 0.0;
    let mut count = 0u32;
    for stat in stats {
        total += effective_rating(participant, stat, effects);
        count += 1;
    }
    if count == 0 { 1.0 } else { total / f64::from(count) }
}

/// Elemental interaction of an attack against the target's first affinity.
pub fn element_multiplier(element: Option<Element>, target: &Participant, config: &DamageConfig) -> f64 {
    let (Some(attack), Some(defence)) = (element, target.stats.elements.first().copied()) else {
        return 1.0;
    };
    if attack.beats() == defence {
        config.strong_element_multiplier
    } else if defence.beats() == attack {
        config.weak_element_multiplier
    } else {
        1.0
    }
}

/// Damage dealt by `spec` from `caster` to `target`, rounded to whole points.
pub fn damage_amount(
    spec: &DamageSpec,
    caster: &Participant,
    target: &Participant,
    effects: &[UserEffect],
    config: &DamageConfig,
) -> u32 {
    let raw = match spec.calculation {
        Calculation::Static => spec.power,
        Calculation::Percentage => spec.power / 100.0 * f64::from(target.pools.health.maximum),
        Calculation::Formula => formula_damage(spec, caster, target, effects, config),
    };
    let scaled = raw * element_multiplier(spec.element, target, config);
    scaled.round().max(0.0) as u32
}

fn formula_damage(
    spec: &DamageSpec,
    caster: &Participant,
    target: &Participant,
    effects: &[UserEffect],
    config: &DamageConfig,
) -> f64 {
    let atk = average(caster, spec.styles.iter().map(|s| Stat::Offence(*s)), effects);
    let def = average(target, spec.styles.iter().map(|s| Stat::Defence(*s)), effects);
    let experience = ((caster.stats.experience + target.stats.experience) / 2.0).max(1.0);

    let mut effect = config.base
        + atk.powf(config.atk_scaling) / def.powf(config.def_scaling)
            * experience.powf(config.exp_scaling);

    if !spec.generals.is_empty() {
        let gen_atk = average(caster, spec.generals.iter().map(|g| Stat::General(*g)), effects);
        let gen_def = average(target, spec.generals.iter().map(|g| Stat::General(*g)), effects);
        effect *= (gen_atk / gen_def).powf(config.gen_scaling);
    }

    (1.0 + spec.power * config.power_scaling) * effect * config.damage_scaling + config.base
}

/// Health restored by `spec` on `target`.
pub fn heal_amount(spec: &HealSpec, target: &Participant) -> u32 {
    let raw = match spec.calculation {
        Calculation::Static => spec.power,
        Calculation::Percentage | Calculation::Formula => {
            spec.power / 100.0 * f64::from(target.pools.health.maximum)
        }
    };
    raw.round().max(0.0) as u32
}
