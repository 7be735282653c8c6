//! Registry of authored action definitions.

use std::collections::BTreeMap;

use combat_core::{
    ActionDefinition, ContentCatalogue, ContentRef, ContentType, EffectKind, EngineConfig,
    TargetKind, TargetMethod,
};

/// Errors raised while registering a definition.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} is registered twice")]
    Duplicate(ContentRef),

    #[error("{0} is a built-in basic move and cannot be overridden")]
    ReservedBasic(ContentRef),

    #[error("{reference} is malformed: {reason}")]
    Invalid {
        reference: ContentRef,
        reason: &'static str,
    },
}

/// Validated technique, item and bloodline definitions keyed by reference.
///
/// Basic moves are resolved by the engine and rejected here.
#[derive(Clone, Debug, Default)]
pub struct ContentRegistry {
    definitions: BTreeMap<ContentRef, ActionDefinition>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores one definition.
    pub fn register(&mut self, definition: ActionDefinition) -> Result<(), RegistryError> {
        let reference = definition.reference();
        if reference.content_type == ContentType::Basic {
            return Err(RegistryError::ReservedBasic(reference));
        }
        if let Some(reason) = check(&definition) {
            return Err(RegistryError::Invalid { reference, reason });
        }
        if self.definitions.contains_key(&reference) {
            return Err(RegistryError::Duplicate(reference));
        }
        tracing::debug!(%reference, "registered action definition");
        self.definitions.insert(reference, definition);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = ActionDefinition>,
    ) -> Result<(), RegistryError> {
        definitions
            .into_iter()
            .try_for_each(|definition| self.register(definition))
    }

    pub fn get(&self, reference: &ContentRef) -> Option<&ActionDefinition> {
        self.definitions.get(reference)
    }

    /// Registered references in `(content_type, id)` order.
    pub fn references(&self) -> impl Iterator<Item = &ContentRef> + '_ {
        self.definitions.keys()
    }

    pub fn of_type(&self, content_type: ContentType) -> impl Iterator<Item = &ActionDefinition> + '_ {
        self.definitions
            .values()
            .filter(move |definition| definition.content_type == content_type)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ContentCatalogue for ContentRegistry {
    fn definition(&self, reference: &ContentRef) -> Option<ActionDefinition> {
        self.definitions.get(reference).cloned()
    }
}

fn check(definition: &ActionDefinition) -> Option<&'static str> {
    let costs = [
        definition.action_cost_perc,
        definition.health_cost_perc,
        definition.chakra_cost_perc,
        definition.stamina_cost_perc,
    ];
    if costs.iter().any(|cost| !(0.0..=100.0).contains(cost)) {
        return Some("cost percentages must lie within 0..=100");
    }
    if definition.health_cost_perc >= 100.0 {
        return Some("a health cost of 100% can never be paid");
    }
    if definition.range > EngineConfig::MAX_BATTLEFIELD_SIDE
        || definition.blast_radius > EngineConfig::MAX_BATTLEFIELD_SIDE
    {
        return Some("range and blast radius cannot exceed the largest battlefield");
    }
    if definition.effects.is_empty() {
        return Some("no effects");
    }
    if definition.target == TargetKind::SelfTarget && definition.method != TargetMethod::Single {
        return Some("self-targeted actions must use the SINGLE method");
    }
    for descriptor in &definition.effects {
        match &descriptor.kind {
            EffectKind::Barrier { power } => {
                if definition.target.targets_participants() {
                    return Some("barriers can only be placed on ground");
                }
                if *power <= 0.0 {
                    return Some("barrier power must be positive");
                }
                if descriptor.rounds == 0 {
                    return Some("barriers need at least one round");
                }
            }
            EffectKind::Move if definition.target != TargetKind::EmptyGround => {
                return Some("movement must target empty ground");
            }
            EffectKind::Flee { chance }
            | EffectKind::Seal { chance }
            | EffectKind::OneHitKill { chance }
                if *chance > 100 =>
            {
                return Some("roll chance exceeds 100");
            }
            kind if kind.is_timed() && descriptor.rounds == 0 => {
                return Some("timed effects need at least one round");
            }
            _ => {}
        }
    }
    None
}
