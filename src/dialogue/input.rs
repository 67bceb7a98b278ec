use serde::{Deserialize, Serialize};

use super::state::DialogueState;
use crate::ast::{Program, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiCommand {
    /// Cancel without a failure message.
    Stop,
    NeverMind,
    Debug,
    WakeUp,
}

/// Interpretation of one user turn, produced by the intent parser upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserInput {
    Answer { value: Value },
    MultipleChoice { index: usize },
    Program { program: Program },
    Prediction { state: DialogueState },
    UiCommand { command: UiCommand },
    Failed { utterance: String },
    Unsupported,
}

impl UserInput {
    pub fn yes() -> Self {
        UserInput::Answer {
            value: Value::Boolean(true),
        }
    }

    pub fn no() -> Self {
        UserInput::Answer {
            value: Value::Boolean(false),
        }
    }
}
