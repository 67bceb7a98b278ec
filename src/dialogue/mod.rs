pub mod dialogue_loop;
pub mod input;
pub mod queue;
pub mod state;
pub mod utils;

pub use dialogue_loop::{DialogueHandle, DialogueLoop};
pub use input::{UiCommand, UserInput};
pub use queue::{DialogueQueue, QueueItem};
pub use state::{ConfirmStatus, DialogueAct, DialogueHistoryItem, DialogueState, StateDelta};
pub use utils::{
    compute_new_state, compute_prediction, is_executable, prepare_context_for_prediction,
    should_auto_confirm, Target,
};
