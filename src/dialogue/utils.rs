//! Pure helpers over dialogue states: merging predictions into the current
//! state, computing deltas and trimming context.

use super::state::{ConfirmStatus, DialogueHistoryItem, DialogueState};
use crate::ast::{FunctionType, Statement};
use crate::executor::DialogueHistoryResultList;

/// Executed items kept when preparing context for a prediction.
const CONTEXT_ITEMS: usize = 3;
const USER_CONTEXT_RESULTS: usize = 1;
const AGENT_CONTEXT_RESULTS: usize = 3;

/// Who produced (or will consume) a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    User { auto_confirm: bool },
    Agent,
}

/// No unfilled or unresolved parameter, and every `require_either` group
/// has at least one member set.
pub fn is_executable(stmt: &Statement) -> bool {
    stmt.invocations().all(|inv| {
        let concrete = inv
            .in_params
            .iter()
            .all(|p| !p.value.is_undefined() && !p.value.is_unresolved_entity());
        let required = inv.schema.as_ref().map_or(true, |schema| {
            schema
                .require_either
                .iter()
                .all(|group| group.iter().any(|name| inv.param(name).is_some()))
        });
        concrete && required
    })
}

/// Queries run without asking; actions and `#[confirm=true]` functions do
/// not. Rules never auto-confirm.
pub fn should_auto_confirm(stmt: &Statement) -> bool {
    if stmt.is_rule() {
        return false;
    }
    !stmt.invocations().any(|inv| {
        match inv.schema.as_ref().and_then(|s| s.confirm) {
            Some(confirm) => confirm,
            None => inv.function_type == FunctionType::Action,
        }
    })
}

fn confirmed_prefix(state: &DialogueState) -> usize {
    state
        .history()
        .iter()
        .take_while(|item| item.confirm == ConfirmStatus::Confirmed)
        .count()
}

/// Applies a prediction to the current state.
///
/// The confirmed prefix of the old history survives; everything after it
/// is replaced by the prediction's items.
pub fn compute_new_state(state: Option<&DialogueState>, prediction: DialogueState, target: Target) -> DialogueState {
    let mut history: Vec<DialogueHistoryItem> = match state {
        Some(state) => state.history()[..confirmed_prefix(state)].to_vec(),
        None => Vec::new(),
    };

    let auto_confirm = matches!(target, Target::User { auto_confirm: true });
    for mut item in prediction.history().iter().cloned() {
        if auto_confirm
            && item.confirm == ConfirmStatus::Accepted
            && is_executable(&item.stmt)
            && should_auto_confirm(&item.stmt)
        {
            item.confirm = ConfirmStatus::Confirmed;
        }
        history.push(item);
    }

    DialogueState::new(
        prediction.policy(),
        prediction.dialogue_act(),
        prediction.dialogue_act_param().map(<[String]>::to_vec),
        history,
    )
}

/// Inverse of `compute_new_state`: the part of `new` that is not already
/// settled in `old`.
pub fn compute_prediction(old: Option<&DialogueState>, new: &DialogueState, target: Target) -> DialogueState {
    let start = match old {
        Some(old) => {
            let prefix = confirmed_prefix(old);
            old.history()
                .iter()
                .zip(new.history())
                .take(prefix)
                .take_while(|(a, b)| a.stmt == b.stmt)
                .count()
        }
        None => 0,
    };

    let delta = new.history()[start..]
        .iter()
        .map(|item| {
            let mut item = DialogueHistoryItem::new(item.stmt.clone(), item.confirm);
            if matches!(target, Target::User { .. }) && should_auto_confirm(&item.stmt) {
                item.confirm = ConfirmStatus::Accepted;
            }
            item
        })
        .collect();

    DialogueState::new(
        new.policy(),
        new.dialogue_act(),
        new.dialogue_act_param().map(<[String]>::to_vec),
        delta,
    )
}

fn trim_results(results: &DialogueHistoryResultList, keep: usize) -> DialogueHistoryResultList {
    let mut trimmed = results.clone();
    trimmed.results.truncate(keep);
    trimmed
}

/// Shrinks a state to what a predictor needs: the last few executed items
/// (dropping earlier ones that report the same function), with their
/// results trimmed, followed by the pending items.
pub fn prepare_context_for_prediction(state: Option<&DialogueState>, target: Target) -> Option<DialogueState> {
    let state = state?;
    let keep_results = match target {
        Target::User { .. } => USER_CONTEXT_RESULTS,
        Target::Agent => AGENT_CONTEXT_RESULTS,
    };

    let split = state.next_index().unwrap_or(state.history().len());
    let (executed, pending) = state.history().split_at(split);

    let mut kept: Vec<DialogueHistoryItem> = Vec::new();
    for item in executed.iter().rev() {
        if kept.len() >= CONTEXT_ITEMS {
            break;
        }
        if kept.iter().any(|later| later.compatible(item)) {
            continue;
        }
        let mut item = item.clone();
        item.results = item.results.as_ref().map(|r| trim_results(r, keep_results));
        kept.push(item);
    }
    kept.reverse();
    kept.extend(pending.iter().cloned());

    Some(DialogueState::new(
        state.policy(),
        state.dialogue_act(),
        state.dialogue_act_param().map(<[String]>::to_vec),
        kept,
    ))
}
