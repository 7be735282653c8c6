//! Enumerates the requests an AI participant could submit.

use combat_core::action::basic;
use combat_core::{ActionRequest, ContentRef, TargetKind};
use tracing::trace;

use super::AiContext;

/// Builds every (action, tile) pair worth simulating.
pub struct CandidateGenerator;

impl CandidateGenerator {
    /// Basic moves offered to AI participants. Fleeing is left to humans.
    const BASIC_MOVES: [&'static str; 4] = [basic::ATTACK, basic::HEAL, basic::MOVE, basic::WAIT];

    /// Candidates in a stable order: loadout entries first, then basic
    /// moves; tiles in row-major order within each action.
    ///
    /// Only shape and range are filtered here. Turn, resources, cooldowns
    /// and target kind are left to the resolver during simulation.
    pub fn generate(ctx: &AiContext<'_>) -> Vec<ActionRequest> {
        let actor = ctx.actor;
        let actions = actor
            .loadout
            .iter()
            .filter(|entry| entry.quantity != Some(0))
            .map(|entry| entry.action.clone())
            .chain(Self::BASIC_MOVES.into_iter().map(ContentRef::basic));

        let mut candidates = Vec::new();
        for action in actions {
            let Some(definition) = ctx.catalogue.resolve(&action) else {
                trace!("Skipping unknown action {} for {}", action, actor.id);
                continue;
            };
            if definition.target == TargetKind::SelfTarget {
                candidates.push(ActionRequest::new(actor.id, action, actor.position));
                continue;
            }
            candidates.extend(
                ctx.battle
                    .battlefield
                    .tiles()
                    .filter(|tile| tile.distance(actor.position) <= definition.range)
                    .map(|tile| ActionRequest::new(actor.id, action.clone(), tile)),
            );
        }
        trace!("Generated {} candidates for {}", candidates.len(), actor.id);
        candidates
    }
}
