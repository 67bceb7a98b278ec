use serde::{Deserialize, Serialize};

use crate::dialogue::{DialogueAct, QueueItem};

// Allowed: kinds, acts, counts, flags
// Forbidden: utterances, values, app output

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    QueueItem { kind: QueueItemKind },

    DialogueAct { act: DialogueAct },

    StatementExecuted {
        count: usize,
        more: bool,
        errored: bool,
    },

    AnswerRejected,

    TurnCancelled,

    TurnFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueItemKind {
    UserInput,
    Notification,
    Error,
}

impl From<&QueueItem> for QueueItemKind {
    fn from(item: &QueueItem) -> Self {
        match item {
            QueueItem::UserInput { .. } => QueueItemKind::UserInput, // Intent STRIPPED
            QueueItem::Notification { .. } => QueueItemKind::Notification, // Output STRIPPED
            QueueItem::Error { .. } => QueueItemKind::Error,
        }
    }
}
