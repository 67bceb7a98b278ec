use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{FunctionDef, FunctionType};
use crate::error::{AgentError, Result};

pub mod thingpedia;

pub use thingpedia::ThingpediaSchemaRetriever;

/// Schema lookup service.
///
/// Implementations must tolerate concurrent calls; batching and caching are
/// their own business.
#[async_trait]
pub trait SchemaRetriever: Send + Sync {
    async fn get_schema_and_names(
        &self,
        kind: &str,
        function_type: FunctionType,
        name: &str,
    ) -> Result<Arc<FunctionDef>>;
}

/// Fixed in-memory schema table. Used by the replay harness and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySchemaRetriever {
    functions: HashMap<(String, FunctionType, String), Arc<FunctionDef>>,
}

impl MemorySchemaRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: FunctionDef) {
        let key = (def.kind.clone(), def.function_type, def.name.clone());
        self.functions.insert(key, Arc::new(def));
    }

    pub fn with(mut self, def: FunctionDef) -> Self {
        self.insert(def);
        self
    }
}

#[async_trait]
impl SchemaRetriever for MemorySchemaRetriever {
    async fn get_schema_and_names(
        &self,
        kind: &str,
        function_type: FunctionType,
        name: &str,
    ) -> Result<Arc<FunctionDef>> {
        self.functions
            .get(&(kind.to_string(), function_type, name.to_string()))
            .cloned()
            .ok_or_else(|| AgentError::SchemaNotFound {
                kind: kind.to_string(),
                function: name.to_string(),
            })
    }
}
