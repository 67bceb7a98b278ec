use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

use crate::ast::Value;

/// Above MORE_SIZE results we stop counting and set the `more` bit.
pub const MORE_SIZE: usize = 50;
/// Above PAGE_SIZE results we keep the count but drop the rows.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub output_type: Option<String>,
    pub output_value: Map<String, Json>,
}

/// One typed result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueHistoryResultItem {
    pub value: BTreeMap<String, Value>,
    pub raw: Option<RawResult>,
}

impl DialogueHistoryResultItem {
    pub fn new(value: BTreeMap<String, Value>) -> Self {
        Self { value, raw: None }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.get(field)
    }
}

/// Paginated, typed outcome of executing one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueHistoryResultList {
    pub results: Vec<DialogueHistoryResultItem>,
    pub count: usize,
    pub more: bool,
    pub error: Option<Value>,
}

impl DialogueHistoryResultList {
    /// Keeps the first PAGE_SIZE items; `count` records how many were seen.
    pub fn new(mut items: Vec<DialogueHistoryResultItem>, more: bool, error: Option<Value>) -> Self {
        let count = items.len();
        items.truncate(PAGE_SIZE);
        Self {
            results: items,
            count,
            more,
            error,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), false, None)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
