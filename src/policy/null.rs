use async_trait::async_trait;

use super::{DialoguePolicy, InteractionState, PolicyKind, TurnContext};
use crate::ast::Value;
use crate::dialogue::DialogueState;
use crate::error::{AgentError, Result};

/// Pass-through policy for interactions outside a multi-turn dialogue.
/// Every answer is rejected and every state is terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPolicy;

#[async_trait]
impl DialoguePolicy for NullPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Null
    }

    async fn handle_answer(&self, _state: &DialogueState, _answer: &Value) -> Result<Option<DialogueState>> {
        Ok(None)
    }

    async fn choose_action(&self, _ctx: &TurnContext<'_>) -> Result<DialogueState> {
        Err(AgentError::NullPolicyAction)
    }

    fn get_interaction_state(&self, _state: &DialogueState) -> InteractionState {
        InteractionState::terminal()
    }
}
