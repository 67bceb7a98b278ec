use std::collections::VecDeque;

use super::event::{QueueItemKind, TelemetryEvent};
use crate::dialogue::DialogueAct;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub queue_stats: QueueStats,
    pub dialogue_stats: DialogueStats,
    pub execution_stats: ExecutionStats,
    pub turn_stats: TurnStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueStats {
    pub user_inputs: u64,
    pub notifications: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueStats {
    pub confirmations: u64,
    pub slot_fills: u64,
    pub results_shown: u64,
    pub empty_searches: u64,
    pub action_successes: u64,
    pub action_errors: u64,
    pub cancels: u64,
    pub generic: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStats {
    pub statements: u64,
    pub total_results: u64,
    pub truncated: u64,
    pub errored: u64,
    pub avg_results: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnStats {
    pub rejected_answers: u64,
    pub cancelled: u64,
    pub failed: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::QueueItem { kind } => match kind {
                QueueItemKind::UserInput => snap.queue_stats.user_inputs += 1,
                QueueItemKind::Notification => snap.queue_stats.notifications += 1,
                QueueItemKind::Error => snap.queue_stats.errors += 1,
            },
            TelemetryEvent::DialogueAct { act } => {
                let stats = &mut snap.dialogue_stats;
                match act {
                    DialogueAct::SysConfirmAction => stats.confirmations += 1,
                    DialogueAct::SysSlotFill => stats.slot_fills += 1,
                    DialogueAct::SysDisplayResult => stats.results_shown += 1,
                    DialogueAct::SysEmptySearch => stats.empty_searches += 1,
                    DialogueAct::SysActionSuccess => stats.action_successes += 1,
                    DialogueAct::SysActionError => stats.action_errors += 1,
                    DialogueAct::Cancel => stats.cancels += 1,
                    DialogueAct::SysGeneric | DialogueAct::Execute => stats.generic += 1,
                }
            }
            TelemetryEvent::StatementExecuted {
                count,
                more,
                errored,
            } => {
                snap.execution_stats.statements += 1;
                snap.execution_stats.total_results += *count as u64;
                if *more {
                    snap.execution_stats.truncated += 1;
                }
                if *errored {
                    snap.execution_stats.errored += 1;
                }
            }
            TelemetryEvent::AnswerRejected => snap.turn_stats.rejected_answers += 1,
            TelemetryEvent::TurnCancelled => snap.turn_stats.cancelled += 1,
            TelemetryEvent::TurnFailed => snap.turn_stats.failed += 1,
        }
    }

    if snap.execution_stats.statements > 0 {
        snap.execution_stats.avg_results =
            snap.execution_stats.total_results as f64 / snap.execution_stats.statements as f64;
    }

    snap
}
