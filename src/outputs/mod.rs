//! Rendering side of the dialogue: the delegate the loop reports to, the
//! text realizer and a recording delegate for tests and the replay harness.

pub mod realizer;
pub mod recording;

use async_trait::async_trait;

use crate::dialogue::DialogueState;
use crate::executor::DialogueHistoryResultList;
use crate::policy::{InteractionState, ValueCategory};

pub use recording::{DelegateEvent, RecordingDelegate};

/// Everything the rendering layer needs after an agent turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub state: DialogueState,
    /// Results of the item executed last, if any.
    pub results: Option<DialogueHistoryResultList>,
    pub interaction: InteractionState,
    pub message: String,
}

/// Rendering layer collaborator. Implementations talk to the user; their
/// failures surface as `AgentError::Delegate`.
#[async_trait]
pub trait ConversationDelegate: Send {
    /// Free text addressed to the user, with an optional app icon.
    async fn reply(&mut self, message: &str, icon: Option<&str>) -> anyhow::Result<()>;

    async fn on_turn(&mut self, turn: &TurnOutput) -> anyhow::Result<()>;

    /// Input the dialogue waits for next; `None` means free-form input.
    async fn set_expected(&mut self, expect: Option<&ValueCategory>) -> anyhow::Result<()>;
}
