use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::VecDeque;

use super::input::UserInput;
use crate::executor::ExecutionError;

/// One unit of work for the dialogue loop. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueItem {
    UserInput {
        intent: UserInput,
        #[serde(default)]
        confident: bool,
    },
    Notification {
        app_id: String,
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        output_type: Option<String>,
        #[serde(default)]
        output_value: Map<String, Json>,
    },
    Error {
        app_id: String,
        #[serde(default)]
        icon: Option<String>,
        error: ExecutionError,
    },
}

impl QueueItem {
    pub fn user_input(intent: UserInput, confident: bool) -> Self {
        QueueItem::UserInput { intent, confident }
    }

    pub fn is_user_input(&self) -> bool {
        matches!(self, QueueItem::UserInput { .. })
    }
}

/// Plain FIFO of pending items: no merging, no priorities.
#[derive(Debug, Default)]
pub struct DialogueQueue {
    items: VecDeque<QueueItem>,
}

impl DialogueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: QueueItem) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
