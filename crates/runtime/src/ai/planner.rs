//! Candidate scoring.

use combat_core::action::basic;
use combat_core::{ActionRequest, Battle, ContentType, ParticipantId};
use tracing::debug;

use super::{AiContext, CandidateGenerator};

/// Picks the request an AI participant submits.
///
/// Implementations must be deterministic for a given context so replays of
/// the same snapshot pick the same action.
pub trait ActionPlanner: Send + Sync {
    /// `None` when nothing the participant could do is legal.
    fn plan(&self, ctx: &AiContext<'_>) -> Option<ActionRequest>;
}

/// Greedy one-step planner.
///
/// Simulates every candidate and keeps the one whose outcome scores
/// highest; the first candidate wins ties. The score rewards:
/// - health the actor regains
/// - health opponents lose
///
/// and subtracts a tenth of a point per tile between the actor and each
/// opponent, so idle participants close in. Waiting costs one point.
#[derive(Clone, Copy, Debug, Default)]
pub struct FitnessPlanner;

impl FitnessPlanner {
    const DISTANCE_WEIGHT: f64 = 0.1;
    const WAIT_PENALTY: f64 = 1.0;

    pub fn new() -> Self {
        Self
    }

    fn fitness(before: &Battle, after: &Battle, actor: ParticipantId, request: &ActionRequest) -> f64 {
        let (Some(was), Some(now)) = (before.participant(actor), after.participant(actor)) else {
            return 0.0;
        };
        let mut fitness = 0.0;
        fitness += f64::from(now.pools.health.current.saturating_sub(was.pools.health.current));
        if request.action.content_type == ContentType::Basic && request.action.id == basic::WAIT {
            fitness -= Self::WAIT_PENALTY;
        }

        for enemy in after.users_state.iter().filter(|p| p.team != now.team) {
            if enemy.is_standing() {
                fitness -= f64::from(enemy.position.distance(now.position)) * Self::DISTANCE_WEIGHT;
            }
            let lost = before.participant(enemy.id).map_or(0, |prior| {
                prior.pools.health.current.saturating_sub(enemy.pools.health.current)
            });
            fitness += f64::from(lost);
        }
        fitness
    }
}

impl ActionPlanner for FitnessPlanner {
    fn plan(&self, ctx: &AiContext<'_>) -> Option<ActionRequest> {
        let mut best: Option<(f64, ActionRequest)> = None;
        for request in CandidateGenerator::generate(ctx) {
            let Some(resolution) = ctx.simulate(&request) else {
                continue;
            };
            let fitness = Self::fitness(ctx.battle, &resolution.battle, ctx.actor.id, &request);
            if best.as_ref().is_none_or(|(score, _)| fitness > *score) {
                best = Some((fitness, request));
            }
        }

        let (fitness, request) = best?;
        debug!(
            "AI {} picked {} at {} (fitness {:.1})",
            ctx.actor.id, request.action, request.target, fitness
        );
        Some(request)
    }
}
