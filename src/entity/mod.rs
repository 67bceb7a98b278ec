//! Entity disambiguation: resolving a free-text reference to one of several
//! candidate entities of the same type.

pub mod distance;
pub mod finder;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::ast::Value;
use crate::dialogue::DialogueState;
use crate::error::Result;

pub use distance::edit_distance;
pub use finder::{get_best_entity_match, EntityRecord};

/// Source of entity candidates for a type and a search term.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn lookup_entity(&self, entity_type: &str, search_term: &str) -> Result<Vec<EntityRecord>>;
}

/// Fixed candidate table keyed by entity type. The search term is ignored;
/// scoring happens in `get_best_entity_match`.
#[derive(Debug, Clone, Default)]
pub struct StaticEntityLookup {
    records: HashMap<String, Vec<EntityRecord>>,
}

impl StaticEntityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: EntityRecord) {
        self.records
            .entry(record.entity_type.clone())
            .or_default()
            .push(record);
    }

    pub fn with(mut self, record: EntityRecord) -> Self {
        self.insert(record);
        self
    }
}

#[async_trait]
impl EntityLookup for StaticEntityLookup {
    async fn lookup_entity(&self, entity_type: &str, _search_term: &str) -> Result<Vec<EntityRecord>> {
        Ok(self.records.get(entity_type).cloned().unwrap_or_default())
    }
}

/// Entities already shown to the user, grouped by type, in the order they
/// appeared. These are preferred over a fresh lookup.
pub fn collect_disambiguation_hints(state: &DialogueState) -> HashMap<String, Vec<EntityRecord>> {
    let mut hints: HashMap<String, Vec<EntityRecord>> = HashMap::new();
    let mut seen = HashSet::new();

    let rows = state
        .history()
        .iter()
        .filter_map(|item| item.results.as_ref())
        .flat_map(|list| list.results.iter());
    for row in rows {
        for value in row.value.values() {
            let Value::Entity {
                value: Some(id),
                kind,
                display: Some(display),
            } = value
            else {
                continue;
            };
            if !seen.insert((kind.clone(), id.clone())) {
                continue;
            }
            hints
                .entry(kind.clone())
                .or_default()
                .push(EntityRecord::new(kind, id, display));
        }
    }
    hints
}
