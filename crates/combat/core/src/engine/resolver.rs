//! Action resolution: align with the clock, validate, apply.
//!
//! The resolver never touches storage. It turns `(snapshot, request, now)`
//! into either a [`ValidationRejection`] or a [`Resolution`] carrying the
//! next snapshot and its history row; the caller commits that against the
//! version it read.

use super::clock::{self, Initiative};
use super::conclusion::{self, Conclusion};
use super::errors::{ResolveError, ResourceKind, TargetProblem, ValidationRejection};
use crate::action::{ActionDefinition, ContentCatalogue, ContentRef, ContentType, TargetKind, TargetMethod};
use crate::config::EngineConfig;
use crate::effect::{
    Application, EffectContext, EffectKind, EffectTag, EffectTarget, advance_effects, apply_effect,
    has_effect, pool_cost_adjustment, prune_expired,
};
use crate::geometry::Targeting;
use crate::history::{AppliedEffect, BattleAction, BattleHistory};
use crate::state::{Battle, BattleStatus, Participant, ParticipantId, Pool, Position, Timestamp};

/// One submitted action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRequest {
    pub actor: ParticipantId,
    pub action: ContentRef,
    /// Aimed tile. For directional shapes it fixes the facing.
    pub target: Position,
}

impl ActionRequest {
    pub fn new(actor: ParticipantId, action: ContentRef, target: Position) -> Self {
        Self {
            actor,
            action,
            target,
        }
    }
}

/// Costs and resolved tiles of a validated action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionPlan {
    pub definition: ActionDefinition,
    pub action_points: u32,
    pub pool_costs: Vec<(Pool, u32)>,
    pub tiles: Vec<Position>,
}

/// Outcome of a successful resolution, ready to commit.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Next snapshot. Its `version` still equals the version it was derived
    /// from; the store assigns the new one on commit.
    pub battle: Battle,
    /// History row for the transition.
    pub action: BattleAction,
    pub knockouts: Vec<BattleHistory>,
    pub conclusion: Option<Conclusion>,
    pub round_advanced: bool,
}

/// Snapshot brought up to date with the clock.
struct Aligned {
    battle: Battle,
    initiative: Initiative,
    lines: Vec<AppliedEffect>,
    knockouts: Vec<(ParticipantId, ParticipantId)>,
}

pub struct ActionResolver<'a, C: ContentCatalogue + ?Sized> {
    catalogue: &'a C,
    config: &'a EngineConfig,
}

impl<'a, C: ContentCatalogue + ?Sized> ActionResolver<'a, C> {
    pub fn new(catalogue: &'a C, config: &'a EngineConfig) -> Self {
        Self { catalogue, config }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Clock evaluation with the resolver's configuration.
    pub fn initiative(&self, battle: &Battle, now: Timestamp, offset_ms: i64) -> Initiative {
        clock::evaluate(battle, now, offset_ms, &self.config.clock)
    }

    /// Runs every check against the clock-aligned snapshot without applying
    /// anything.
    pub fn validate(
        &self,
        battle: &Battle,
        request: &ActionRequest,
        now: Timestamp,
    ) -> Result<ActionPlan, ResolveError> {
        let aligned = self.align(battle, now)?;
        self.check(&aligned.battle, &aligned.initiative, request, now)
    }

    /// Validates and applies `request`, producing the next snapshot.
    pub fn resolve(
        &self,
        battle: &Battle,
        request: &ActionRequest,
        now: Timestamp,
    ) -> Result<Resolution, ResolveError> {
        let round_advanced = self.initiative(battle, now, 0).advanced;
        let Aligned {
            battle: mut next,
            initiative,
            mut lines,
            knockouts: mut knockout_pairs,
        } = self.align(battle, now)?;
        let plan = self.check(&next, &initiative, request, now)?;
        let definition = &plan.definition;

        // ====================================================================
        // Costs
        // ====================================================================
        let actor = participant_mut(&mut next, request.actor)?;
        actor.action_points = actor.action_points.saturating_sub(plan.action_points);
        if definition.ends_turn {
            actor.action_points = 0;
        }
        for (pool, cost) in &plan.pool_costs {
            actor.pools.get_mut(*pool).drain(*cost);
        }
        if let Some(quantity) = actor
            .loadout_entry_mut(&request.action)
            .and_then(|entry| entry.quantity.as_mut())
        {
            *quantity = quantity.saturating_sub(1);
        }
        actor.record_use(&request.action, now);
        let actor_name = actor.name.clone();

        // ====================================================================
        // Effects
        // ====================================================================
        prune_expired(&mut next);
        let target_name = next
            .occupant_at(request.target)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| request.target.to_string());
        let description = render(&definition.description, &actor_name, &target_name, request.target);

        let applications: Vec<Vec<Application>> = definition
            .effects
            .iter()
            .map(|descriptor| match descriptor.target {
                EffectTarget::Caster => vec![Application::Participant(request.actor)],
                EffectTarget::Inherit => {
                    applications_for(&next, definition, request.actor, &plan.tiles, &descriptor.kind)
                }
            })
            .collect();

        let mut ctx = EffectContext::new(&mut next, request.actor, &request.action, self.config);
        for (descriptor, targets) in definition.effects.iter().zip(applications) {
            for application in targets {
                apply_effect(&mut ctx, descriptor, application)?;
            }
        }
        lines.append(&mut ctx.lines);
        knockout_pairs.append(&mut ctx.knockouts);

        // ====================================================================
        // Bookkeeping
        // ====================================================================
        next.updated_at = now;
        next.active_user_id = self.initiative(&next, now, 0).active;
        let conclusion = conclusion::detect(&next);
        if conclusion.is_some() {
            next.status = BattleStatus::Concluded;
            next.active_user_id = None;
        }

        let knockouts = knockout_pairs
            .into_iter()
            .map(|(attacker, defender)| BattleHistory {
                battle_id: next.id,
                attacker,
                defender,
                created_at: now,
            })
            .collect();

        let action = BattleAction {
            battle_id: next.id,
            battle_version: battle.version + 1,
            battle_round: next.round,
            description,
            applied_effects: lines,
            created_at: now,
        };

        Ok(Resolution {
            battle: next,
            action,
            knockouts,
            conclusion,
            round_advanced,
        })
    }

    /// Applies a due round change: refill, restart the round, tick effects.
    fn align(&self, battle: &Battle, now: Timestamp) -> Result<Aligned, ResolveError> {
        if !battle.is_writable() {
            return Err(ResolveError::NotWritable(battle.status));
        }
        let mut next = battle.clone();
        let initiative = self.initiative(battle, now, 0);
        let mut lines = Vec::new();
        let mut knockouts = Vec::new();

        if initiative.advanced {
            next.round = initiative.round;
            next.round_start_at = initiative.round_start_at;
            next.active_user_id = initiative.active;
            for participant in next.users_state.iter_mut().filter(|p| p.is_standing()) {
                participant.action_points = self.config.clock.max_action_points;
            }
            let (tick_lines, tick_knockouts) = advance_effects(&mut next, self.config)?;
            lines = tick_lines;
            knockouts = tick_knockouts;
        }

        // residual ticks may have knocked someone out
        let initiative = self.initiative(&next, now, 0);
        let initiative = Initiative {
            advanced: false,
            ..initiative
        };
        Ok(Aligned {
            battle: next,
            initiative,
            lines,
            knockouts,
        })
    }

    /// Checks, in order: turn and seal, resources, cooldown, range and target
    /// kind, ground occupancy.
    fn check(
        &self,
        battle: &Battle,
        initiative: &Initiative,
        request: &ActionRequest,
        now: Timestamp,
    ) -> Result<ActionPlan, ResolveError> {
        let actor = battle
            .participant(request.actor)
            .ok_or(ResolveError::UnknownParticipant(request.actor))?;
        let definition = self
            .catalogue
            .resolve(&request.action)
            .ok_or_else(|| ResolveError::UnknownAction(request.action.clone()))?;
        let loadout = actor.loadout_entry(&request.action);
        if request.action.content_type != ContentType::Basic && loadout.is_none() {
            return Err(ResolveError::UnknownAction(request.action.clone()));
        }

        // (a) turn
        let eligible = actor.is_standing()
            && (initiative.is_active(actor.id) || definition.off_turn);
        if !eligible {
            return Err(ValidationRejection::NotYourTurn {
                actor: actor.id,
                active: initiative.active,
            }
            .into());
        }
        if request.action.content_type == ContentType::Bloodline
            && has_effect(battle, actor.id, EffectTag::Seal)
        {
            return Err(ValidationRejection::Sealed {
                action: request.action.clone(),
            }
            .into());
        }

        // (b) resources
        let usable = initiative.usable_for(actor.id);
        let action_points = ap_cost(definition.action_cost_perc, self.config.clock.max_action_points);
        if usable < action_points {
            return Err(insufficient(ResourceKind::ActionPoints, action_points, usable));
        }
        let mut pool_costs = Vec::new();
        let cost_scale = (1.0 + pool_cost_adjustment(battle, actor.id) / 100.0).max(0.0);
        for pool in [Pool::Health, Pool::Chakra, Pool::Stamina] {
            let meter = actor.pools.get(pool);
            let cost = meter.percent_of_max(definition.pool_cost_perc(pool) * cost_scale);
            if cost == 0 {
                continue;
            }
            // paying health must leave the actor standing
            let affordable = match pool {
                Pool::Health => meter.current > cost,
                Pool::Chakra | Pool::Stamina => meter.current >= cost,
            };
            if !affordable {
                return Err(insufficient(resource_of(pool), cost, meter.current));
            }
            pool_costs.push((pool, cost));
        }
        if loadout.and_then(|entry| entry.quantity) == Some(0) {
            return Err(insufficient(ResourceKind::Quantity, 1, 0));
        }

        // (c) cooldown
        let last_used = actor.last_used(&request.action);
        if let (true, Some(last_used)) = (definition.cooldown > 0, last_used) {
            let needed = self.config.cooldown_ms(definition.cooldown);
            let elapsed = now.millis_since(last_used);
            if elapsed < needed {
                return Err(ValidationRejection::OnCooldown {
                    action: request.action.clone(),
                    remaining_ms: needed - elapsed,
                }
                .into());
            }
        }

        // (d) range and target kind
        check_target(battle, actor, &definition, request.target)?;

        // (e) occupancy
        if definition.method == TargetMethod::Single
            && definition.target == TargetKind::EmptyGround
            && !battle.is_tile_free(request.target)
        {
            return Err(illegal(request.target, TargetProblem::Occupied));
        }

        let tiles = resolve_tiles(battle, actor.position, &definition, request.target);
        Ok(ActionPlan {
            definition,
            action_points,
            pool_costs,
            tiles,
        })
    }
}

fn check_target(
    battle: &Battle,
    actor: &Participant,
    definition: &ActionDefinition,
    target: Position,
) -> Result<(), ResolveError> {
    if !battle.battlefield.contains(target) {
        return Err(illegal(target, TargetProblem::OffBattlefield));
    }
    if definition.target == TargetKind::SelfTarget && target != actor.position {
        return Err(illegal(target, TargetProblem::WrongKind));
    }

    let distance = actor.position.distance(target);
    match definition.method {
        TargetMethod::Single | TargetMethod::AoeWallShoot | TargetMethod::AoeCircleShoot => {
            if distance > definition.range {
                return Err(ValidationRejection::OutOfRange {
                    target,
                    distance,
                    range: definition.range,
                }
                .into());
            }
        }
        TargetMethod::AoeLineShoot | TargetMethod::AoeSpiralShoot => {
            if distance == 0 && definition.target != TargetKind::SelfTarget {
                return Err(illegal(target, TargetProblem::NoDirection));
            }
        }
        TargetMethod::All | TargetMethod::AoeCircleSpawn => {}
    }

    if definition.method == TargetMethod::Single && definition.target.targets_participants() {
        let occupant = battle
            .occupant_at(target)
            .ok_or_else(|| illegal(target, TargetProblem::NoParticipant))?;
        if !admits(definition.target, actor, occupant) {
            return Err(illegal(target, TargetProblem::WrongKind));
        }
    }
    Ok(())
}

/// Whether `candidate` is a legal recipient for `kind` when cast by `actor`.
fn admits(kind: TargetKind, actor: &Participant, candidate: &Participant) -> bool {
    match kind {
        TargetKind::SelfTarget => candidate.id == actor.id,
        TargetKind::OtherUser => candidate.id != actor.id,
        TargetKind::Opponent => candidate.team != actor.team,
        TargetKind::Ally => candidate.team == actor.team,
        TargetKind::Character => true,
        TargetKind::Ground | TargetKind::EmptyGround => false,
    }
}

fn resolve_tiles(
    battle: &Battle,
    origin: Position,
    definition: &ActionDefinition,
    target: Position,
) -> Vec<Position> {
    let mut tiles = Targeting::at(origin, target, definition.method, definition.range)
        .with_blast_radius(definition.blast_radius)
        .tiles(&battle.battlefield);
    // projectiles stop at the first barrier
    if definition.method == TargetMethod::AoeLineShoot {
        if let Some(index) = tiles.iter().position(|tile| battle.barrier_at(*tile).is_some()) {
            tiles.truncate(index + 1);
        }
    }
    tiles
}

fn applications_for(
    battle: &Battle,
    definition: &ActionDefinition,
    actor_id: ParticipantId,
    tiles: &[Position],
    kind: &EffectKind,
) -> Vec<Application> {
    let Some(actor) = battle.participant(actor_id) else {
        return Vec::new();
    };
    match definition.target {
        TargetKind::Ground => tiles.iter().map(|tile| Application::Tile(*tile)).collect(),
        TargetKind::EmptyGround => tiles
            .iter()
            .filter(|tile| battle.is_tile_free(**tile))
            .map(|tile| Application::Tile(*tile))
            .collect(),
        kind_filter => tiles
            .iter()
            .filter_map(|tile| {
                if let Some(occupant) = battle.occupant_at(*tile) {
                    return admits(kind_filter, actor, occupant)
                        .then_some(Application::Participant(occupant.id));
                }
                // damage aimed at a barrier wears it down
                let hits_barrier =
                    matches!(kind, EffectKind::Damage(_)) && battle.barrier_at(*tile).is_some();
                hits_barrier.then_some(Application::Tile(*tile))
            })
            .collect(),
    }
}

fn render(template: &str, user: &str, target: &str, location: Position) -> String {
    template
        .replace("%user", user)
        .replace("%target", target)
        .replace("%location", &location.to_string())
}

fn ap_cost(perc: f64, max_action_points: u32) -> u32 {
    if perc <= 0.0 {
        return 0;
    }
    (perc * f64::from(max_action_points) / 100.0).ceil() as u32
}

fn resource_of(pool: Pool) -> ResourceKind {
    match pool {
        Pool::Health => ResourceKind::Health,
        Pool::Chakra => ResourceKind::Chakra,
        Pool::Stamina => ResourceKind::Stamina,
    }
}

fn insufficient(resource: ResourceKind, required: u32, available: u32) -> ResolveError {
    ValidationRejection::InsufficientResource {
        resource,
        required,
        available,
    }
    .into()
}

fn illegal(target: Position, problem: TargetProblem) -> ResolveError {
    ValidationRejection::IllegalTarget { target, problem }.into()
}

fn participant_mut(battle: &mut Battle, id: ParticipantId) -> Result<&mut Participant, ResolveError> {
    battle
        .participant_mut(id)
        .ok_or(ResolveError::UnknownParticipant(id))
}
