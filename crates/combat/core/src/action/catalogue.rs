use std::collections::HashMap;

use super::basic;
use super::definition::{ActionDefinition, ContentRef, ContentType};

/// Read-only lookup of action definitions.
///
/// Implementations live outside the engine (files, databases). Basic moves
/// are resolved by the engine itself and never need to be registered.
pub trait ContentCatalogue: Send + Sync {
    fn definition(&self, reference: &ContentRef) -> Option<ActionDefinition>;

    /// Resolves basic moves first, then defers to the catalogue.
    fn resolve(&self, reference: &ContentRef) -> Option<ActionDefinition> {
        if reference.content_type == ContentType::Basic {
            return basic::lookup(&reference.id);
        }
        self.definition(reference)
    }
}

/// In-memory catalogue keyed by content reference.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalogue {
    definitions: HashMap<ContentRef, ActionDefinition>,
}

impl StaticCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, definition: ActionDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn insert(&mut self, definition: ActionDefinition) {
        self.definitions.insert(definition.reference(), definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ContentCatalogue for StaticCatalogue {
    fn definition(&self, reference: &ContentRef) -> Option<ActionDefinition> {
        self.definitions.get(reference).cloned()
    }
}
