use async_trait::async_trait;
use tracing::{debug, info};

use super::{DialoguePolicy, InteractionState, PolicyKind, TurnContext, ValueCategory};
use crate::ast::Value;
use crate::dialogue::{
    is_executable, should_auto_confirm, ConfirmStatus, DialogueAct, DialogueHistoryItem,
    DialogueState, StateDelta,
};
use crate::entity::{collect_disambiguation_hints, get_best_entity_match};
use crate::error::Result;

/// What the action rules look at: the state after execution and the item
/// executed last during this turn.
struct Outcome<'a> {
    state: &'a DialogueState,
    executed: Option<&'a DialogueHistoryItem>,
}

type Selection = (DialogueAct, Option<Vec<String>>);

struct ActionRule {
    name: &'static str,
    select: fn(&Outcome<'_>) -> Option<Selection>,
}

/// Evaluated in order; the first rule that fires picks the act.
const ACTION_RULES: &[ActionRule] = &[
    ActionRule { name: "cancel", select: cancelled },
    ActionRule { name: "slot_fill", select: slot_fill },
    ActionRule { name: "confirm", select: confirm },
    ActionRule { name: "action_error", select: action_error },
    ActionRule { name: "action_success", select: action_success },
    ActionRule { name: "empty_search", select: empty_search },
    ActionRule { name: "display_result", select: display_result },
];

fn cancelled(outcome: &Outcome<'_>) -> Option<Selection> {
    (outcome.state.dialogue_act() == DialogueAct::Cancel).then_some((DialogueAct::Cancel, None))
}

fn slot_fill(outcome: &Outcome<'_>) -> Option<Selection> {
    let next = outcome.state.next()?;
    if next.confirm == ConfirmStatus::Proposed {
        return None;
    }
    let missing = next
        .stmt
        .invocations()
        .flat_map(|inv| inv.in_params.iter())
        .find(|p| p.value.is_undefined() || p.value.is_unresolved_entity())?;
    Some((DialogueAct::SysSlotFill, Some(vec![missing.name.clone()])))
}

fn confirm(outcome: &Outcome<'_>) -> Option<Selection> {
    let next = outcome.state.next()?;
    (next.confirm == ConfirmStatus::Accepted).then_some((DialogueAct::SysConfirmAction, None))
}

fn action_error(outcome: &Outcome<'_>) -> Option<Selection> {
    let results = outcome.executed?.results.as_ref()?;
    results.has_error().then_some((DialogueAct::SysActionError, None))
}

fn action_success(outcome: &Outcome<'_>) -> Option<Selection> {
    let item = outcome.executed?;
    item.stmt.has_action().then_some((DialogueAct::SysActionSuccess, None))
}

fn empty_search(outcome: &Outcome<'_>) -> Option<Selection> {
    let results = outcome.executed?.results.as_ref()?;
    results.is_empty().then_some((DialogueAct::SysEmptySearch, None))
}

fn display_result(outcome: &Outcome<'_>) -> Option<Selection> {
    outcome.executed.map(|_| (DialogueAct::SysDisplayResult, None))
}

/// Answers typed as plain text fill entity slots by display name; the
/// entity is resolved on the next action.
fn coerce_answer(current: &Value, answer: &Value) -> Value {
    match (current, answer) {
        (Value::Entity { kind, .. }, Value::String(display)) => Value::Entity {
            value: None,
            kind: kind.clone(),
            display: Some(display.clone()),
        },
        _ => answer.clone(),
    }
}

/// Rule-driven transactional policy: execute what the user asked for,
/// confirming actions and filling missing slots first.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionPolicy;

impl TransactionPolicy {
    async fn resolve_entities(&self, state: &mut DialogueState, ctx: &TurnContext<'_>) -> Result<()> {
        let Some(start) = state.next_index() else {
            return Ok(());
        };
        let hints = collect_disambiguation_hints(state);

        let unresolved: Vec<(usize, String, String, String)> = state
            .history()
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(_, item)| item.confirm != ConfirmStatus::Proposed)
            .flat_map(|(index, item)| {
                item.stmt
                    .invocations()
                    .flat_map(|inv| inv.in_params.iter())
                    .filter_map(|param| match &param.value {
                        Value::Entity {
                            value: None,
                            kind,
                            display: Some(display),
                        } => Some((index, param.name.clone(), kind.clone(), display.clone())),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut deltas = Vec::new();
        for (index, name, kind, display) in unresolved {
            let candidates = match (hints.get(&kind), ctx.entities) {
                (Some(hinted), _) => hinted.clone(),
                (None, Some(lookup)) => lookup.lookup_entity(&kind, &display).await?,
                (None, None) => Vec::new(),
            };
            // candidates carry a lowercased canonical form
            let search_term = display.to_lowercase();
            match get_best_entity_match(&search_term, &kind, &candidates) {
                Some(best) => deltas.push(StateDelta::SetParam {
                    index,
                    name,
                    value: Value::Entity {
                        value: Some(best.value.clone()),
                        kind: kind.clone(),
                        display: Some(best.name.clone()),
                    },
                }),
                None => debug!(%kind, "no entity candidates"),
            }
        }
        for delta in deltas {
            state.reduce(delta);
        }

        // Resolution can make an accepted query executable.
        if ctx.confident {
            let ready: Vec<usize> = state
                .history()
                .iter()
                .enumerate()
                .skip(start)
                .filter(|(_, item)| {
                    item.confirm == ConfirmStatus::Accepted
                        && is_executable(&item.stmt)
                        && should_auto_confirm(&item.stmt)
                })
                .map(|(index, _)| index)
                .collect();
            for index in ready {
                state.reduce(StateDelta::Confirm {
                    index,
                    status: ConfirmStatus::Confirmed,
                });
            }
        }
        Ok(())
    }

    /// Runs confirmed items in history order, stopping at the first item
    /// that still needs the user. Returns the index of the last one run.
    async fn execute_confirmed(&self, state: &mut DialogueState, ctx: &TurnContext<'_>) -> Result<Option<usize>> {
        let mut last = None;
        while let Some(index) = state.next_index() {
            let item = &state.history()[index];
            if item.confirm != ConfirmStatus::Confirmed || !is_executable(&item.stmt) {
                break;
            }
            let results = ctx.executor.execute_statement(&item.stmt).await?;
            state.reduce(StateDelta::RecordResults { index, results });
            last = Some(index);
        }
        Ok(last)
    }
}

#[async_trait]
impl DialoguePolicy for TransactionPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Transaction
    }

    async fn handle_answer(&self, state: &DialogueState, answer: &Value) -> Result<Option<DialogueState>> {
        let Some(index) = state.next_index() else {
            return Ok(None);
        };
        let next = &state.history()[index];

        match (state.dialogue_act(), answer) {
            (DialogueAct::SysConfirmAction, Value::Boolean(accepted)) => {
                if next.confirm != ConfirmStatus::Accepted {
                    return Ok(None);
                }
                let mut updated = state.clone();
                if *accepted {
                    updated.reduce(StateDelta::Confirm {
                        index,
                        status: ConfirmStatus::Confirmed,
                    });
                    updated.set_act(DialogueAct::Execute, None);
                } else {
                    updated.reduce(StateDelta::Confirm {
                        index,
                        status: ConfirmStatus::Proposed,
                    });
                    updated.set_act(DialogueAct::Cancel, None);
                }
                Ok(Some(updated))
            }
            (DialogueAct::SysSlotFill, answer) if !answer.is_undefined() => {
                let Some(name) = state.dialogue_act_param().and_then(|p| p.first()) else {
                    return Ok(None);
                };
                let Some(current) = next.stmt.invocations().find_map(|inv| inv.param(name)) else {
                    return Ok(None);
                };
                let mut updated = state.clone();
                updated.reduce(StateDelta::SetParam {
                    index,
                    name: name.clone(),
                    value: coerce_answer(current, answer),
                });
                updated.set_act(DialogueAct::Execute, None);
                Ok(Some(updated))
            }
            _ => Ok(None),
        }
    }

    async fn choose_action(&self, ctx: &TurnContext<'_>) -> Result<DialogueState> {
        let mut state = ctx.state.clone();

        let executed = if state.dialogue_act() == DialogueAct::Cancel {
            None
        } else {
            self.resolve_entities(&mut state, ctx).await?;
            self.execute_confirmed(&mut state, ctx).await?
        };

        let (rule, (act, param)) = {
            let outcome = Outcome {
                state: &state,
                executed: executed.map(|index| &state.history()[index]),
            };
            ACTION_RULES
                .iter()
                .find_map(|rule| (rule.select)(&outcome).map(|selection| (rule.name, selection)))
                .unwrap_or(("generic", (DialogueAct::SysGeneric, None)))
        };
        info!(rule, act = %act, "transaction policy chose action");

        state.set_act(act, param);
        Ok(state)
    }

    fn get_interaction_state(&self, state: &DialogueState) -> InteractionState {
        match state.dialogue_act() {
            DialogueAct::Cancel
            | DialogueAct::SysActionSuccess
            | DialogueAct::SysActionError
            | DialogueAct::SysGeneric => InteractionState::terminal(),
            DialogueAct::SysConfirmAction => InteractionState::expecting(Some(ValueCategory::YesNo)),
            DialogueAct::SysSlotFill => InteractionState::expecting(Some(slot_category(state))),
            DialogueAct::SysDisplayResult | DialogueAct::SysEmptySearch => {
                InteractionState::expecting(Some(ValueCategory::Command))
            }
            DialogueAct::Execute => InteractionState::expecting(None),
        }
    }
}

/// Category of the slot being filled: the declared argument type when the
/// schema is attached, otherwise the type of the placeholder value.
fn slot_category(state: &DialogueState) -> ValueCategory {
    let (Some(name), Some(next)) = (
        state.dialogue_act_param().and_then(|p| p.first()),
        state.next(),
    ) else {
        return ValueCategory::Generic;
    };

    next.stmt
        .invocations()
        .find_map(|inv| {
            let declared = inv.schema.as_ref().and_then(|s| s.get_arg_type(name)).cloned();
            declared.or_else(|| {
                inv.param(name)
                    .filter(|v| !v.is_undefined())
                    .map(Value::get_type)
            })
        })
        .map(|ty| ValueCategory::from_type(&ty))
        .unwrap_or(ValueCategory::Generic)
}
