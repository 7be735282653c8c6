//! Effect application, stacking and round-by-round expiry.

use super::damage::{damage_amount, heal_amount};
use super::{Calculation, EffectDescriptor, EffectKind, EffectTag, ResidualPayload};
use crate::action::ContentRef;
use crate::config::EngineConfig;
use crate::env::{PcgRng, RngOracle, compute_seed};
use crate::error::{CombatError, ErrorSeverity};
use crate::history::{AppliedEffect, LineColor};
use crate::state::{Battle, GroundEffect, Participant, ParticipantId, Position, UserEffect};

/// Where a single effect lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Application {
    Participant(ParticipantId),
    Tile(Position),
}

/// Errors raised while applying effects.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("participant {0} is not part of the battle")]
    ParticipantMissing(ParticipantId),
}

impl CombatError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ParticipantMissing(_) => "EFFECT_PARTICIPANT_MISSING",
        }
    }
}

// ============================================================================
// Effect Context
// ============================================================================

/// Mutable state shared by every effect of one action.
pub struct EffectContext<'a> {
    pub battle: &'a mut Battle,

    /// The participant performing the action.
    pub caster: ParticipantId,

    /// Action the effects belong to.
    pub origin: &'a ContentRef,

    pub config: &'a EngineConfig,

    /// Outcome lines, in application order.
    pub lines: Vec<AppliedEffect>,

    /// (attacker, defender) pairs knocked out during this action.
    pub knockouts: Vec<(ParticipantId, ParticipantId)>,

    stacking: bool,
    rolls: u32,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        battle: &'a mut Battle,
        caster: ParticipantId,
        origin: &'a ContentRef,
        config: &'a EngineConfig,
    ) -> Self {
        let stacking = battle.stacking_enabled(config);
        Self {
            battle,
            caster,
            origin,
            config,
            lines: Vec::new(),
            knockouts: Vec::new(),
            stacking,
            rolls: 0,
        }
    }

    fn name_of(&self, id: ParticipantId) -> Result<String, EffectError> {
        self.battle
            .participant(id)
            .map(|p| p.name.clone())
            .ok_or(EffectError::ParticipantMissing(id))
    }

    fn line(&mut self, text: String, color: LineColor) {
        self.lines.push(AppliedEffect::new(text, color));
    }

    fn next_seed(&mut self) -> u64 {
        let seed = compute_seed(self.battle.id.0, self.battle.version, self.caster.0, self.rolls);
        self.rolls += 1;
        seed
    }
}

// ============================================================================
// Effect Dispatcher
// ============================================================================

/// Applies one descriptor at one application point.
pub fn apply_effect(
    ctx: &mut EffectContext<'_>,
    descriptor: &EffectDescriptor,
    application: Application,
) -> Result<(), EffectError> {
    match (&descriptor.kind, application) {
        (EffectKind::Damage(spec), Application::Participant(target)) => {
            let amount = {
                let caster = participant(ctx.battle, ctx.caster)?;
                let defender = participant(ctx.battle, target)?;
                if !defender.is_standing() {
                    return Ok(());
                }
                damage_amount(spec, caster, defender, &ctx.battle.users_effects, &ctx.config.damage)
            };
            let attacker = ctx.caster;
            deal_damage(ctx, attacker, target, amount)
        }
        (EffectKind::Damage(spec), Application::Tile(position)) => {
            if absorb_with_barrier(ctx, position, spec.power) {
                return Ok(());
            }
            match occupant(ctx.battle, position) {
                Some(target) => apply_effect(ctx, descriptor, Application::Participant(target)),
                None => Ok(()),
            }
        }
        (EffectKind::Heal(spec), Application::Participant(target)) => {
            let amount = {
                let patient = participant(ctx.battle, target)?;
                if !patient.is_standing() {
                    return Ok(());
                }
                heal_amount(spec, patient)
            };
            restore_health(ctx, target, amount)
        }
        (
            EffectKind::StatAdjust { .. }
            | EffectKind::Stun { .. }
            | EffectKind::Residual(_)
            | EffectKind::StunPrevent
            | EffectKind::FleePrevent
            | EffectKind::Seal { .. }
            | EffectKind::SealPrevent
            | EffectKind::OneHitKillPrevent
            | EffectKind::Absorb { .. }
            | EffectKind::Reflect { .. }
            | EffectKind::AdjustDamageGiven { .. }
            | EffectKind::AdjustDamageTaken { .. }
            | EffectKind::PoolCostAdjust { .. },
            Application::Participant(target),
        ) => attach(ctx, descriptor, target),
        (EffectKind::Residual(payload), Application::Tile(position)) => {
            place_ground(ctx, descriptor, position, residual_ground_power(payload))
        }
        (
            EffectKind::Heal(_)
            | EffectKind::StatAdjust { .. }
            | EffectKind::Stun { .. }
            | EffectKind::StunPrevent
            | EffectKind::FleePrevent
            | EffectKind::Seal { .. }
            | EffectKind::SealPrevent
            | EffectKind::OneHitKill { .. }
            | EffectKind::OneHitKillPrevent
            | EffectKind::Absorb { .. }
            | EffectKind::Reflect { .. }
            | EffectKind::AdjustDamageGiven { .. }
            | EffectKind::AdjustDamageTaken { .. }
            | EffectKind::PoolCostAdjust { .. },
            Application::Tile(position),
        ) => match occupant(ctx.battle, position) {
            Some(target) => apply_effect(ctx, descriptor, Application::Participant(target)),
            None => Ok(()),
        },
        (EffectKind::OneHitKill { chance }, Application::Participant(target)) => {
            if !participant(ctx.battle, target)?.is_standing() {
                return Ok(());
            }
            let seed = ctx.next_seed();
            let name = ctx.name_of(target)?;
            if !PcgRng.chance(seed, *chance) {
                ctx.line(format!("{name} was lucky not to get killed"), LineColor::Blue);
            } else if has_effect(ctx.battle, target, EffectTag::OneHitKillPrevent) {
                ctx.line(format!("{name} resisted being killed"), LineColor::Blue);
            } else {
                let remaining = participant(ctx.battle, target)?.pools.health.current;
                let attacker = ctx.caster;
                strike(ctx, attacker, target, remaining)?;
            }
            Ok(())
        }
        (EffectKind::Cleanse { tags }, Application::Participant(target)) => {
            let before = ctx.battle.users_effects.len();
            ctx.battle
                .users_effects
                .retain(|e| !(e.target == target && matches_tags(tags, e.tag())));
            let removed = before - ctx.battle.users_effects.len();
            let name = ctx.name_of(target)?;
            ctx.line(format!("{name} is cleansed of {removed} effects"), LineColor::Blue);
            Ok(())
        }
        (EffectKind::Cleanse { tags }, Application::Tile(position)) => {
            let before = ctx.battle.ground_effects.len();
            ctx.battle
                .ground_effects
                .retain(|g| !(g.position == position && matches_tags(tags, g.tag())));
            if ctx.battle.ground_effects.len() < before {
                ctx.line(format!("Ground effects at {position} are cleared"), LineColor::Blue);
            }
            Ok(())
        }
        (EffectKind::Move, Application::Tile(position)) => {
            if !ctx.battle.is_tile_free(position) {
                return Ok(());
            }
            let caster = ctx.caster;
            let mover = participant_mut(ctx.battle, caster)?;
            mover.position = position;
            let name = mover.name.clone();
            ctx.line(format!("{name} moves to {position}"), LineColor::Blue);
            Ok(())
        }
        (EffectKind::Flee { chance }, Application::Participant(target)) => {
            let seed = ctx.next_seed();
            let escaped =
                PcgRng.chance(seed, *chance) && !has_effect(ctx.battle, target, EffectTag::FleePrevent);
            let runner = participant_mut(ctx.battle, target)?;
            if !runner.is_standing() {
                return Ok(());
            }
            let name = runner.name.clone();
            if escaped {
                runner.fled = true;
                ctx.line(format!("{name} manages to flee the battle"), LineColor::Blue);
            } else {
                ctx.line(format!("{name} fails to flee the battle"), LineColor::Blue);
            }
            Ok(())
        }
        (EffectKind::Barrier { power }, Application::Tile(position)) => {
            if !ctx.battle.is_tile_free(position) {
                return Ok(());
            }
            place_ground(ctx, descriptor, position, *power)
        }
        (
            EffectKind::Move | EffectKind::Barrier { .. },
            Application::Participant(_),
        )
        | (EffectKind::Flee { .. }, Application::Tile(_)) => Ok(()),
    }
}

fn matches_tags(tags: &[EffectTag], tag: EffectTag) -> bool {
    tags.is_empty() || tags.contains(&tag)
}

fn participant(battle: &Battle, id: ParticipantId) -> Result<&Participant, EffectError> {
    battle.participant(id).ok_or(EffectError::ParticipantMissing(id))
}

fn participant_mut(
    battle: &mut Battle,
    id: ParticipantId,
) -> Result<&mut Participant, EffectError> {
    battle
        .participant_mut(id)
        .ok_or(EffectError::ParticipantMissing(id))
}

fn occupant(battle: &Battle, position: Position) -> Option<ParticipantId> {
    battle.occupant_at(position).map(|p| p.id)
}

/// A hit after damage modifiers, absorption and reflection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Hit {
    damage: u32,
    absorbed: u32,
    reflected: u32,
}

fn shape_hit(battle: &Battle, attacker: ParticipantId, target: ParticipantId, amount: u32) -> Hit {
    let base = f64::from(amount);
    let mut damage = base;
    for effect in battle.users_effects.iter().filter(|e| !e.is_expired()) {
        match effect.kind {
            EffectKind::AdjustDamageGiven { power, calculation } if effect.target == attacker => {
                damage += portion(power, calculation, base);
            }
            EffectKind::AdjustDamageTaken { power, calculation } if effect.target == target => {
                damage -= portion(power, calculation, base);
            }
            _ => {}
        }
    }
    let mut damage = damage.round().max(0.0);

    let mut hit = Hit::default();
    for effect in battle
        .users_effects
        .iter()
        .filter(|e| e.target == target && !e.is_expired())
    {
        let (power, calculation, reflect) = match effect.kind {
            EffectKind::Absorb { power, calculation } => (power, calculation, false),
            EffectKind::Reflect { power, calculation } if attacker != target => {
                (power, calculation, true)
            }
            _ => continue,
        };
        let convert = portion(power, calculation, damage).ceil().clamp(0.0, damage);
        damage -= convert;
        if reflect {
            hit.reflected += convert as u32;
        } else {
            hit.absorbed += convert as u32;
        }
    }
    hit.damage = damage as u32;
    hit
}

/// Percentage calculations take `power` percent of `amount`; the others use
/// `power` as points.
fn portion(power: f64, calculation: Calculation, amount: f64) -> f64 {
    match calculation {
        Calculation::Percentage => amount * power / 100.0,
        Calculation::Static | Calculation::Formula => power,
    }
}

fn deal_damage(
    ctx: &mut EffectContext<'_>,
    attacker: ParticipantId,
    target: ParticipantId,
    amount: u32,
) -> Result<(), EffectError> {
    let hit = shape_hit(ctx.battle, attacker, target, amount);
    strike(ctx, attacker, target, hit.damage)?;

    if hit.absorbed > 0 {
        let defender = participant_mut(ctx.battle, target)?;
        if defender.is_standing() {
            let restored = defender.pools.health.restore(hit.absorbed);
            let name = defender.name.clone();
            ctx.line(format!("{name} absorbs {restored} damage as health"), LineColor::Green);
        }
    }
    if hit.reflected > 0 && participant(ctx.battle, attacker)?.is_standing() {
        let name = ctx.name_of(target)?;
        ctx.line(format!("{name} reflects {} damage", hit.reflected), LineColor::Blue);
        strike(ctx, target, attacker, hit.reflected)?;
    }
    Ok(())
}

/// Drains health with no modifiers, recording a knockout.
fn strike(
    ctx: &mut EffectContext<'_>,
    attacker: ParticipantId,
    target: ParticipantId,
    amount: u32,
) -> Result<(), EffectError> {
    let defender = participant_mut(ctx.battle, target)?;
    let dealt = defender.pools.health.drain(amount);
    let knocked_out = defender.is_knocked_out();
    let name = defender.name.clone();
    ctx.line(format!("{name} takes {dealt} damage"), LineColor::Red);
    if knocked_out {
        ctx.line(format!("{name} was knocked out"), LineColor::Red);
        ctx.knockouts.push((attacker, target));
    }
    Ok(())
}

/// Whether `id` carries an active effect with `tag`.
pub fn has_effect(battle: &Battle, id: ParticipantId, tag: EffectTag) -> bool {
    battle
        .users_effects
        .iter()
        .any(|e| e.target == id && e.tag() == tag && !e.is_expired())
}

/// Percent change applied to the pool costs of `id`'s actions.
pub fn pool_cost_adjustment(battle: &Battle, id: ParticipantId) -> f64 {
    battle
        .users_effects
        .iter()
        .filter(|e| e.target == id && !e.is_expired())
        .filter_map(|e| match e.kind {
            EffectKind::PoolCostAdjust { power } => Some(power),
            _ => None,
        })
        .sum()
}

fn restore_health(
    ctx: &mut EffectContext<'_>,
    target: ParticipantId,
    amount: u32,
) -> Result<(), EffectError> {
    let patient = participant_mut(ctx.battle, target)?;
    let restored = patient.pools.health.restore(amount);
    let name = patient.name.clone();
    ctx.line(format!("{name} heals {restored} HP"), LineColor::Green);
    Ok(())
}

/// Barrier on the tile soaks the hit. Returns true when one was present.
fn absorb_with_barrier(ctx: &mut EffectContext<'_>, position: Position, power: f64) -> bool {
    let Some(barrier) = ctx
        .battle
        .ground_effects
        .iter_mut()
        .find(|g| g.position == position && g.is_barrier() && !g.is_expired())
    else {
        return false;
    };
    barrier.magnitude -= power;
    let line = if barrier.magnitude <= 0.0 {
        format!("The barrier at {position} is destroyed")
    } else {
        format!("The barrier at {position} absorbs {power} damage")
    };
    ctx.line(line, LineColor::Blue);
    ctx.battle.ground_effects.retain(|g| !g.is_expired());
    true
}

/// Per-round power of a residual anchored to a tile. Formula payloads fall
/// back to their raw power since the caster may have left the tile.
fn residual_ground_power(payload: &ResidualPayload) -> f64 {
    match payload {
        ResidualPayload::Damage(spec) => spec.power,
        ResidualPayload::Heal(spec) => spec.power,
    }
}

/// Stores a timed effect on a participant, honouring the stacking policy.
fn attach(
    ctx: &mut EffectContext<'_>,
    descriptor: &EffectDescriptor,
    target: ParticipantId,
) -> Result<(), EffectError> {
    let magnitude = {
        let defender = participant(ctx.battle, target)?;
        if !defender.is_standing() {
            return Ok(());
        }
        match &descriptor.kind {
            EffectKind::StatAdjust { power, .. } => *power,
            EffectKind::Stun { power } => f64::from(*power),
            EffectKind::Residual(ResidualPayload::Damage(spec)) => {
                let caster = participant(ctx.battle, ctx.caster)?;
                f64::from(damage_amount(
                    spec,
                    caster,
                    defender,
                    &ctx.battle.users_effects,
                    &ctx.config.damage,
                ))
            }
            EffectKind::Residual(ResidualPayload::Heal(spec)) => f64::from(heal_amount(spec, defender)),
            EffectKind::Absorb { power, .. }
            | EffectKind::Reflect { power, .. }
            | EffectKind::AdjustDamageGiven { power, .. }
            | EffectKind::AdjustDamageTaken { power, .. }
            | EffectKind::PoolCostAdjust { power } => *power,
            EffectKind::StunPrevent
            | EffectKind::FleePrevent
            | EffectKind::Seal { .. }
            | EffectKind::SealPrevent
            | EffectKind::OneHitKillPrevent => 1.0,
            _ => return Ok(()),
        }
    };

    // resisted effects never land
    let resisted = match &descriptor.kind {
        EffectKind::Stun { .. } => has_effect(ctx.battle, target, EffectTag::StunPrevent),
        EffectKind::Seal { chance } => {
            let seed = ctx.next_seed();
            if !PcgRng.chance(seed, *chance) {
                let name = ctx.name_of(target)?;
                ctx.line(format!("{name}'s bloodline was not sealed"), LineColor::Blue);
                return Ok(());
            }
            has_effect(ctx.battle, target, EffectTag::SealPrevent)
        }
        _ => false,
    };
    if resisted {
        let name = ctx.name_of(target)?;
        let what = match descriptor.kind {
            EffectKind::Seal { .. } => "bloodline sealing",
            _ => "being stunned",
        };
        ctx.line(format!("{name} resists {what}"), LineColor::Blue);
        return Ok(());
    }

    // a residual always lands once when applied
    if let EffectKind::Residual(payload) = &descriptor.kind {
        let source = ctx.caster;
        tick_residual(ctx, source, target, payload, magnitude)?;
    }
    if descriptor.rounds == 0 {
        return Ok(());
    }

    let tag = descriptor.kind.tag();
    if !ctx.stacking {
        ctx.battle
            .users_effects
            .retain(|e| !(e.target == target && e.tag() == tag));
    }
    ctx.battle.users_effects.push(UserEffect {
        source: ctx.caster,
        target,
        origin: ctx.origin.clone(),
        kind: descriptor.kind.clone(),
        magnitude,
        rounds: descriptor.rounds,
        created_round: ctx.battle.round,
    });

    let name = ctx.name_of(target)?;
    let rounds = descriptor.rounds;
    let text = match &descriptor.kind {
        EffectKind::StatAdjust { power, .. } if *power >= 0.0 => {
            format!("{name} is strengthened for {rounds} rounds")
        }
        EffectKind::StatAdjust { .. } => format!("{name} is weakened for {rounds} rounds"),
        EffectKind::Stun { .. } => format!("{name} is stunned for {rounds} rounds"),
        EffectKind::Seal { .. } => format!("{name}'s bloodline is sealed for {rounds} rounds"),
        EffectKind::StunPrevent => format!("{name} cannot be stunned for {rounds} rounds"),
        EffectKind::FleePrevent => format!("{name} cannot flee for {rounds} rounds"),
        EffectKind::SealPrevent => format!("{name}'s bloodline cannot be sealed for {rounds} rounds"),
        EffectKind::OneHitKillPrevent => format!("{name} cannot be killed outright for {rounds} rounds"),
        EffectKind::Absorb { .. } => format!("{name} absorbs damage for {rounds} rounds"),
        EffectKind::Reflect { .. } => format!("{name} reflects damage for {rounds} rounds"),
        _ => format!("{name} is afflicted for {rounds} rounds"),
    };
    ctx.line(text, LineColor::Blue);
    Ok(())
}

fn place_ground(
    ctx: &mut EffectContext<'_>,
    descriptor: &EffectDescriptor,
    position: Position,
    magnitude: f64,
) -> Result<(), EffectError> {
    if descriptor.rounds == 0 || !ctx.battle.battlefield.contains(position) {
        return Ok(());
    }
    let tag = descriptor.kind.tag();
    if !ctx.stacking {
        ctx.battle
            .ground_effects
            .retain(|g| !(g.position == position && g.tag() == tag));
    }
    ctx.battle.ground_effects.push(GroundEffect {
        source: ctx.caster,
        position,
        origin: ctx.origin.clone(),
        kind: descriptor.kind.clone(),
        magnitude,
        rounds: descriptor.rounds,
        created_round: ctx.battle.round,
    });
    let text = match descriptor.kind {
        EffectKind::Barrier { .. } => format!("A barrier rises at {position}"),
        _ => format!("The ground at {position} is affected"),
    };
    ctx.line(text, LineColor::Blue);
    Ok(())
}

fn tick_residual(
    ctx: &mut EffectContext<'_>,
    source: ParticipantId,
    target: ParticipantId,
    payload: &ResidualPayload,
    magnitude: f64,
) -> Result<(), EffectError> {
    let amount = magnitude.round().max(0.0) as u32;
    match payload {
        ResidualPayload::Damage(_) => strike(ctx, source, target, amount),
        ResidualPayload::Heal(_) => restore_health(ctx, target, amount),
    }
}

// ============================================================================
// Round Lifecycle
// ============================================================================

/// Drops effects whose counter reached zero and depleted barriers.
pub fn prune_expired(battle: &mut Battle) {
    battle.users_effects.retain(|e| !e.is_expired());
    battle.ground_effects.retain(|g| !g.is_expired());
}

/// Round change: decrement every counter, prune, then re-apply residuals
/// (participant residuals to their target, ground residuals to whoever
/// stands on the tile).
///
/// An effect applied with `rounds = n` is therefore present for the round it
/// was applied in plus the following `n - 1` rounds.
pub fn advance_effects(
    battle: &mut Battle,
    config: &EngineConfig,
) -> Result<(Vec<AppliedEffect>, Vec<(ParticipantId, ParticipantId)>), EffectError> {
    for effect in &mut battle.users_effects {
        effect.rounds = effect.rounds.saturating_sub(1);
    }
    for effect in &mut battle.ground_effects {
        effect.rounds = effect.rounds.saturating_sub(1);
    }
    prune_expired(battle);

    let residuals: Vec<(ParticipantId, ParticipantId, ResidualPayload, f64, ContentRef)> = battle
        .users_effects
        .iter()
        .filter_map(|e| match &e.kind {
            EffectKind::Residual(payload) => {
                Some((e.source, e.target, payload.clone(), e.magnitude, e.origin.clone()))
            }
            _ => None,
        })
        .collect();
    let grounds: Vec<(ParticipantId, Position, ResidualPayload, f64, ContentRef)> = battle
        .ground_effects
        .iter()
        .filter_map(|g| match &g.kind {
            EffectKind::Residual(payload) => {
                Some((g.source, g.position, payload.clone(), g.magnitude, g.origin.clone()))
            }
            _ => None,
        })
        .collect();

    let mut lines = Vec::new();
    let mut knockouts = Vec::new();

    for (source, target, payload, magnitude, origin) in residuals {
        let standing = battle.participant(target).is_some_and(|p| p.is_standing());
        if !standing {
            continue;
        }
        let mut ctx = EffectContext::new(battle, source, &origin, config);
        tick_residual(&mut ctx, source, target, &payload, magnitude)?;
        lines.append(&mut ctx.lines);
        knockouts.append(&mut ctx.knockouts);
    }

    for (source, position, payload, power, origin) in grounds {
        let Some(target) = occupant(battle, position) else {
            continue;
        };
        let amount = match &payload {
            ResidualPayload::Damage(spec) if spec.calculation == Calculation::Percentage => {
                percent_of_health(battle, target, power)
            }
            ResidualPayload::Heal(spec) if spec.calculation == Calculation::Percentage => {
                percent_of_health(battle, target, power)
            }
            _ => power,
        };
        let mut ctx = EffectContext::new(battle, source, &origin, config);
        tick_residual(&mut ctx, source, target, &payload, amount)?;
        lines.append(&mut ctx.lines);
        knockouts.append(&mut ctx.knockouts);
    }

    Ok((lines, knockouts))
}

fn percent_of_health(battle: &Battle, target: ParticipantId, percent: f64) -> f64 {
    battle
        .participant(target)
        .map(|p| f64::from(p.pools.health.percent_of_max(percent)))
        .unwrap_or(0.0)
}

/// Action points withheld from `id` by active stuns.
///
/// With `advancing` set, only stuns that survive the next decrement count.
pub fn stun_reduction(battle: &Battle, id: ParticipantId, advancing: bool) -> u32 {
    let threshold = u32::from(advancing);
    battle
        .users_effects
        .iter()
        .filter(|e| e.target == id && e.rounds > threshold)
        .filter_map(|e| match e.kind {
            EffectKind::Stun { .. } => Some(e.magnitude.max(0.0) as u32),
            _ => None,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ContentType;
    use crate::effect::{DamageSpec, HealSpec};
    use crate::state::{BattleId, BattleType, Battlefield, Style, Team, Timestamp};

    fn battle(battle_type: BattleType) -> Battle {
        let a = Participant::new(ParticipantId(1), "Naruto", Team(1), Position::new(0, 0));
        let b = Participant::new(ParticipantId(2), "Sasuke", Team(2), Position::new(1, 0));
        Battle::new(BattleId(1), battle_type, Battlefield::default(), vec![a, b], Timestamp(0))
            .expect("valid battle")
    }

    fn origin() -> ContentRef {
        ContentRef::new(ContentType::Jutsu, "test")
    }

    fn buff(power: f64, rounds: u32) -> EffectDescriptor {
        EffectDescriptor::new(EffectKind::StatAdjust {
            power,
            calculation: Calculation::Percentage,
            styles: vec![Style::Ninjutsu],
            generals: Vec::new(),
        })
        .with_rounds(rounds)
    }

    fn apply(battle: &mut Battle, descriptor: &EffectDescriptor, application: Application) -> Vec<AppliedEffect> {
        let origin = origin();
        let config = EngineConfig::default();
        let mut ctx = EffectContext::new(battle, ParticipantId(1), &origin, &config);
        apply_effect(&mut ctx, descriptor, application).expect("effect applies");
        ctx.lines
    }

    fn health(battle: &Battle, id: u32) -> u32 {
        battle.participant(ParticipantId(id)).expect("participant").pools.health.current
    }

    #[test]
    fn static_damage_reduces_health_and_logs_target() {
        let mut battle = battle(BattleType::Arena);
        let lines = apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Damage(DamageSpec::fixed(30.0))),
            Application::Participant(ParticipantId(2)),
        );
        assert_eq!(health(&battle, 2), 70);
        assert_eq!(lines, vec![AppliedEffect::new("Sasuke takes 30 damage", LineColor::Red)]);
    }

    #[test]
    fn lethal_damage_records_knockout() {
        let mut battle = battle(BattleType::Arena);
        let origin = origin();
        let config = EngineConfig::default();
        let mut ctx = EffectContext::new(&mut battle, ParticipantId(1), &origin, &config);
        let descriptor = EffectDescriptor::new(EffectKind::Damage(DamageSpec::fixed(500.0)));
        apply_effect(&mut ctx, &descriptor, Application::Participant(ParticipantId(2))).expect("applies");
        assert_eq!(ctx.knockouts, vec![(ParticipantId(1), ParticipantId(2))]);
        assert!(battle.participant(ParticipantId(2)).expect("p").is_knocked_out());
    }

    #[test]
    fn heal_is_capped_at_maximum() {
        let mut battle = battle(BattleType::Arena);
        battle.participant_mut(ParticipantId(2)).expect("p").pools.health.drain(5);
        let lines = apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Heal(HealSpec {
                power: 50.0,
                calculation: Calculation::Static,
            })),
            Application::Participant(ParticipantId(2)),
        );
        assert_eq!(health(&battle, 2), 100);
        assert_eq!(lines[0].color, LineColor::Green);
        assert_eq!(lines[0].text, "Sasuke heals 5 HP");
    }

    #[test]
    fn effect_with_two_rounds_expires_after_second_round() {
        let mut battle = battle(BattleType::Arena);
        let config = EngineConfig::default();
        apply(&mut battle, &buff(20.0, 2), Application::Participant(ParticipantId(2)));
        assert_eq!(battle.users_effects.len(), 1, "present in round n");

        advance_effects(&mut battle, &config).expect("advance");
        assert_eq!(battle.users_effects.len(), 1, "present in round n + 1");

        advance_effects(&mut battle, &config).expect("advance");
        assert!(battle.users_effects.is_empty(), "absent in round n + 2");
    }

    #[test]
    fn stacking_battles_keep_independent_timers() {
        let mut battle = battle(BattleType::Training);
        let config = EngineConfig::default();
        apply(&mut battle, &buff(20.0, 1), Application::Participant(ParticipantId(2)));
        apply(&mut battle, &buff(30.0, 3), Application::Participant(ParticipantId(2)));

        let total: f64 = battle.users_effects.iter().map(|e| e.magnitude).sum();
        assert_eq!(battle.users_effects.len(), 2);
        assert!((total - 50.0).abs() < f64::EPSILON);

        advance_effects(&mut battle, &config).expect("advance");
        assert_eq!(battle.users_effects.len(), 1);
        assert_eq!(battle.users_effects[0].rounds, 2);
    }

    #[test]
    fn non_stacking_battles_replace_prior_instance() {
        let mut battle = battle(BattleType::Tournament);
        apply(&mut battle, &buff(20.0, 1), Application::Participant(ParticipantId(2)));
        apply(&mut battle, &buff(30.0, 3), Application::Participant(ParticipantId(2)));

        assert_eq!(battle.users_effects.len(), 1);
        assert_eq!(battle.users_effects[0].magnitude, 30.0);
        assert_eq!(battle.users_effects[0].rounds, 3);
    }

    #[test]
    fn residual_damage_ticks_each_round_until_expiry() {
        let mut battle = battle(BattleType::Arena);
        let config = EngineConfig::default();
        let poison = EffectDescriptor::new(EffectKind::Residual(ResidualPayload::Damage(
            DamageSpec::fixed(10.0),
        )))
        .with_rounds(2);
        apply(&mut battle, &poison, Application::Participant(ParticipantId(2)));
        assert_eq!(health(&battle, 2), 90);

        let (lines, _) = advance_effects(&mut battle, &config).expect("advance");
        assert_eq!(health(&battle, 2), 80);
        assert_eq!(lines[0].text, "Sasuke takes 10 damage");

        let (lines, _) = advance_effects(&mut battle, &config).expect("advance");
        assert_eq!(health(&battle, 2), 80);
        assert!(lines.is_empty());
    }

    #[test]
    fn stun_reduction_sums_active_stuns() {
        let mut battle = battle(BattleType::Training);
        let stun = |power, rounds| EffectDescriptor::new(EffectKind::Stun { power }).with_rounds(rounds);
        apply(&mut battle, &stun(20, 1), Application::Participant(ParticipantId(2)));
        apply(&mut battle, &stun(15, 2), Application::Participant(ParticipantId(2)));

        assert_eq!(stun_reduction(&battle, ParticipantId(2), false), 35);
        assert_eq!(stun_reduction(&battle, ParticipantId(2), true), 15);
        assert_eq!(stun_reduction(&battle, ParticipantId(1), false), 0);
    }

    #[test]
    fn cleanse_removes_matching_tags_only() {
        let mut battle = battle(BattleType::Training);
        apply(&mut battle, &buff(10.0, 3), Application::Participant(ParticipantId(2)));
        apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Stun { power: 10 }).with_rounds(3),
            Application::Participant(ParticipantId(2)),
        );
        apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Cleanse {
                tags: vec![EffectTag::Stun],
            }),
            Application::Participant(ParticipantId(2)),
        );
        assert_eq!(battle.users_effects.len(), 1);
        assert_eq!(battle.users_effects[0].tag(), EffectTag::StatAdjust);
    }

    #[test]
    fn barrier_blocks_tile_and_absorbs_damage() {
        let mut battle = battle(BattleType::Arena);
        let tile = Position::new(3, 0);
        apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Barrier { power: 25.0 }).with_rounds(3),
            Application::Tile(tile),
        );
        assert!(!battle.is_tile_free(tile));

        apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Damage(DamageSpec::fixed(10.0))),
            Application::Tile(tile),
        );
        assert_eq!(battle.ground_effects[0].magnitude, 15.0);

        apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Damage(DamageSpec::fixed(20.0))),
            Application::Tile(tile),
        );
        assert!(battle.ground_effects.is_empty());
        assert!(battle.is_tile_free(tile));
    }

    #[test]
    fn move_relocates_caster_onto_free_tile() {
        let mut battle = battle(BattleType::Arena);
        apply(&mut battle, &EffectDescriptor::new(EffectKind::Move), Application::Tile(Position::new(0, 1)));
        assert_eq!(battle.participant(ParticipantId(1)).expect("p").position, Position::new(0, 1));

        // occupied tile: no movement
        apply(&mut battle, &EffectDescriptor::new(EffectKind::Move), Application::Tile(Position::new(1, 0)));
        assert_eq!(battle.participant(ParticipantId(1)).expect("p").position, Position::new(0, 1));
    }

    #[test]
    fn certain_flee_always_succeeds() {
        let mut battle = battle(BattleType::Arena);
        apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Flee { chance: 100 }),
            Application::Participant(ParticipantId(1)),
        );
        assert!(battle.participant(ParticipantId(1)).expect("p").fled);
    }

    #[test]
    fn ground_residual_hits_occupant_each_round() {
        let mut battle = battle(BattleType::Arena);
        let config = EngineConfig::default();
        let fire = EffectDescriptor::new(EffectKind::Residual(ResidualPayload::Damage(
            DamageSpec::fixed(5.0),
        )))
        .with_rounds(3);
        apply(&mut battle, &fire, Application::Tile(Position::new(1, 0)));
        assert_eq!(battle.ground_effects.len(), 1);

        advance_effects(&mut battle, &config).expect("advance");
        assert_eq!(health(&battle, 2), 95);
    }

    fn timed(kind: EffectKind) -> EffectDescriptor {
        EffectDescriptor::new(kind).with_rounds(2)
    }

    fn strike_sasuke(battle: &mut Battle, power: f64) -> Vec<AppliedEffect> {
        apply(
            battle,
            &EffectDescriptor::new(EffectKind::Damage(DamageSpec::fixed(power))),
            Application::Participant(ParticipantId(2)),
        )
    }

    #[test]
    fn stun_prevention_resists_new_stuns() {
        let mut battle = battle(BattleType::Arena);
        apply(&mut battle, &timed(EffectKind::StunPrevent), Application::Participant(ParticipantId(2)));
        let lines = apply(
            &mut battle,
            &timed(EffectKind::Stun { power: 40 }),
            Application::Participant(ParticipantId(2)),
        );
        assert_eq!(stun_reduction(&battle, ParticipantId(2), false), 0);
        assert_eq!(lines, vec![AppliedEffect::new("Sasuke resists being stunned", LineColor::Blue)]);
    }

    #[test]
    fn flee_prevention_pins_the_runner() {
        let mut battle = battle(BattleType::Arena);
        apply(&mut battle, &timed(EffectKind::FleePrevent), Application::Participant(ParticipantId(1)));
        apply(
            &mut battle,
            &EffectDescriptor::new(EffectKind::Flee { chance: 100 }),
            Application::Participant(ParticipantId(1)),
        );
        assert!(!battle.participant(ParticipantId(1)).expect("p").fled);
    }

    #[test]
    fn seal_lands_unless_prevented() {
        let mut sealed = battle(BattleType::Arena);
        apply(&mut sealed, &timed(EffectKind::Seal { chance: 100 }), Application::Tile(Position::new(1, 0)));
        assert!(has_effect(&sealed, ParticipantId(2), EffectTag::Seal));

        let mut guarded = battle(BattleType::Arena);
        apply(&mut guarded, &timed(EffectKind::SealPrevent), Application::Participant(ParticipantId(2)));
        let lines = apply(
            &mut guarded,
            &timed(EffectKind::Seal { chance: 100 }),
            Application::Participant(ParticipantId(2)),
        );
        assert!(!has_effect(&guarded, ParticipantId(2), EffectTag::Seal));
        assert_eq!(lines[0].text, "Sasuke resists bloodline sealing");

        let mut lucky = battle(BattleType::Arena);
        apply(&mut lucky, &timed(EffectKind::Seal { chance: 0 }), Application::Participant(ParticipantId(2)));
        assert!(lucky.users_effects.is_empty());
    }

    #[test]
    fn one_hit_kill_knocks_out_unless_prevented() {
        let mut victim = battle(BattleType::Arena);
        let origin = origin();
        let config = EngineConfig::default();
        let kill = EffectDescriptor::new(EffectKind::OneHitKill { chance: 100 });
        {
            let mut ctx = EffectContext::new(&mut victim, ParticipantId(1), &origin, &config);
            apply_effect(&mut ctx, &kill, Application::Participant(ParticipantId(2))).expect("applies");
            assert_eq!(ctx.knockouts, vec![(ParticipantId(1), ParticipantId(2))]);
        }
        assert!(victim.participant(ParticipantId(2)).expect("p").is_knocked_out());

        let mut guarded = battle(BattleType::Arena);
        apply(
            &mut guarded,
            &timed(EffectKind::OneHitKillPrevent),
            Application::Participant(ParticipantId(2)),
        );
        let lines = apply(&mut guarded, &kill, Application::Participant(ParticipantId(2)));
        assert_eq!(health(&guarded, 2), 100);
        assert_eq!(lines[0].text, "Sasuke resisted being killed");
    }

    #[test]
    fn absorb_turns_part_of_a_hit_into_health() {
        let mut battle = battle(BattleType::Arena);
        apply(
            &mut battle,
            &timed(EffectKind::Absorb {
                power: 10.0,
                calculation: Calculation::Static,
            }),
            Application::Participant(ParticipantId(2)),
        );
        let lines = strike_sasuke(&mut battle, 30.0);
        assert_eq!(health(&battle, 2), 90);
        assert_eq!(
            lines,
            vec![
                AppliedEffect::new("Sasuke takes 20 damage", LineColor::Red),
                AppliedEffect::new("Sasuke absorbs 10 damage as health", LineColor::Green),
            ]
        );
    }

    #[test]
    fn reflect_sends_part_of_a_hit_back() {
        let mut battle = battle(BattleType::Arena);
        apply(
            &mut battle,
            &timed(EffectKind::Reflect {
                power: 50.0,
                calculation: Calculation::Percentage,
            }),
            Application::Participant(ParticipantId(2)),
        );
        strike_sasuke(&mut battle, 30.0);
        assert_eq!(health(&battle, 2), 85);
        assert_eq!(health(&battle, 1), 85);
    }

    #[test]
    fn damage_adjustments_scale_hits_from_both_sides() {
        let mut battle = battle(BattleType::Arena);
        apply(
            &mut battle,
            &timed(EffectKind::AdjustDamageGiven {
                power: 20.0,
                calculation: Calculation::Percentage,
            }),
            Application::Participant(ParticipantId(1)),
        );
        apply(
            &mut battle,
            &timed(EffectKind::AdjustDamageTaken {
                power: 5.0,
                calculation: Calculation::Static,
            }),
            Application::Participant(ParticipantId(2)),
        );
        strike_sasuke(&mut battle, 30.0);
        assert_eq!(health(&battle, 2), 69);

        // heavy damage reduction floors at zero
        apply(
            &mut battle,
            &timed(EffectKind::AdjustDamageTaken {
                power: 500.0,
                calculation: Calculation::Static,
            }),
            Application::Participant(ParticipantId(2)),
        );
        strike_sasuke(&mut battle, 30.0);
        assert_eq!(health(&battle, 2), 69);
    }

    #[test]
    fn pool_cost_adjustments_sum_per_participant() {
        let mut battle = battle(BattleType::Training);
        apply(
            &mut battle,
            &timed(EffectKind::PoolCostAdjust { power: -50.0 }),
            Application::Participant(ParticipantId(1)),
        );
        apply(
            &mut battle,
            &timed(EffectKind::PoolCostAdjust { power: 20.0 }),
            Application::Participant(ParticipantId(1)),
        );
        assert_eq!(pool_cost_adjustment(&battle, ParticipantId(1)), -30.0);
        assert_eq!(pool_cost_adjustment(&battle, ParticipantId(2)), 0.0);
    }
}
