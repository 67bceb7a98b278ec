use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::{DialoguePolicy, NullPolicy, TransactionPolicy};
use crate::error::AgentError;

/// Closed set of policies a dialogue state can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PolicyKind {
    Transaction,
    Null,
}

impl PolicyKind {
    pub const fn name(&self) -> &'static str {
        match self {
            PolicyKind::Transaction => "org.thingpedia.dialogue.transaction",
            PolicyKind::Null => "org.thingpedia.dialogue.null",
        }
    }

    pub fn create(self) -> Arc<dyn DialoguePolicy> {
        match self {
            PolicyKind::Transaction => Arc::new(TransactionPolicy),
            PolicyKind::Null => Arc::new(NullPolicy),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [PolicyKind::Transaction, PolicyKind::Null]
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AgentError::UnknownPolicy(s.to_string()))
    }
}

impl TryFrom<String> for PolicyKind {
    type Error = AgentError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PolicyKind> for String {
    fn from(kind: PolicyKind) -> Self {
        kind.name().to_string()
    }
}

/// Lazily instantiated policies, one per kind and per dialogue.
#[derive(Default)]
pub struct PolicyRegistry {
    policies: HashMap<PolicyKind, Arc<dyn DialoguePolicy>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the implementation used for `kind`.
    pub fn install(&mut self, kind: PolicyKind, policy: Arc<dyn DialoguePolicy>) {
        self.policies.insert(kind, policy);
    }

    pub fn get(&mut self, kind: PolicyKind) -> Arc<dyn DialoguePolicy> {
        self.policies
            .entry(kind)
            .or_insert_with(|| {
                debug!(policy = kind.name(), "instantiating dialogue policy");
                kind.create()
            })
            .clone()
    }
}
