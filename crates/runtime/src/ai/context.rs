//! Read-only view handed to planners.

use combat_core::{
    ActionRequest, ActionResolver, Battle, ContentCatalogue, Participant, Resolution, Timestamp,
};

/// Snapshot, acting participant and the rules to simulate with.
pub struct AiContext<'a> {
    pub battle: &'a Battle,
    pub actor: &'a Participant,
    pub catalogue: &'a dyn ContentCatalogue,
    pub resolver: &'a ActionResolver<'a, dyn ContentCatalogue>,
    /// Instant every candidate is simulated at.
    pub now: Timestamp,
}

impl<'a> AiContext<'a> {
    pub fn new(
        battle: &'a Battle,
        actor: &'a Participant,
        catalogue: &'a dyn ContentCatalogue,
        resolver: &'a ActionResolver<'a, dyn ContentCatalogue>,
        now: Timestamp,
    ) -> Self {
        Self {
            battle,
            actor,
            catalogue,
            resolver,
            now,
        }
    }

    /// Resolves `request` without committing it. `None` when the rules
    /// reject it.
    pub fn simulate(&self, request: &ActionRequest) -> Option<Resolution> {
        self.resolver.resolve(self.battle, request, self.now).ok()
    }
}
