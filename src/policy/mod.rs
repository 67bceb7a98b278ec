//! Dialogue policies: what to do with an answer, which act the agent plays
//! next, and what input the dialogue waits for.

pub mod null;
pub mod registry;
pub mod transaction;
pub mod value_category;

use async_trait::async_trait;

use crate::ast::Value;
use crate::dialogue::DialogueState;
use crate::entity::EntityLookup;
use crate::error::Result;
use crate::executor::StatementExecutor;

pub use null::NullPolicy;
pub use registry::{PolicyKind, PolicyRegistry};
pub use transaction::TransactionPolicy;
pub use value_category::ValueCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionState {
    pub is_terminal: bool,
    pub expect: Option<ValueCategory>,
}

impl InteractionState {
    pub fn terminal() -> Self {
        Self {
            is_terminal: true,
            expect: None,
        }
    }

    pub fn expecting(expect: Option<ValueCategory>) -> Self {
        Self {
            is_terminal: false,
            expect,
        }
    }
}

/// Collaborators available to a policy while choosing the agent's action.
pub struct TurnContext<'a> {
    pub state: &'a DialogueState,
    pub executor: &'a StatementExecutor,
    pub entities: Option<&'a dyn EntityLookup>,
    /// Whether the parser was confident about the user's last input.
    pub confident: bool,
}

#[async_trait]
pub trait DialoguePolicy: Send + Sync {
    fn kind(&self) -> PolicyKind;

    /// Interprets a direct answer against the current state. `None` means
    /// the answer does not fit and is discarded.
    async fn handle_answer(&self, state: &DialogueState, answer: &Value) -> Result<Option<DialogueState>>;

    /// Executes what is ready and picks the agent's next act.
    async fn choose_action(&self, ctx: &TurnContext<'_>) -> Result<DialogueState>;

    fn get_interaction_state(&self, state: &DialogueState) -> InteractionState;
}
