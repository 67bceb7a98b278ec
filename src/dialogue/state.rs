use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::ast::{Statement, Value};
use crate::executor::DialogueHistoryResultList;
use crate::policy::PolicyKind;

/// Closed vocabulary of dialogue acts, user side and agent side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueAct {
    Execute,
    Cancel,
    SysConfirmAction,
    SysSlotFill,
    SysDisplayResult,
    SysEmptySearch,
    SysActionSuccess,
    SysActionError,
    SysGeneric,
}

impl DialogueAct {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueAct::Execute => "execute",
            DialogueAct::Cancel => "cancel",
            DialogueAct::SysConfirmAction => "sys_confirm_action",
            DialogueAct::SysSlotFill => "sys_slot_fill",
            DialogueAct::SysDisplayResult => "sys_display_result",
            DialogueAct::SysEmptySearch => "sys_empty_search",
            DialogueAct::SysActionSuccess => "sys_action_success",
            DialogueAct::SysActionError => "sys_action_error",
            DialogueAct::SysGeneric => "sys_generic",
        }
    }
}

impl fmt::Display for DialogueAct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmStatus {
    Proposed,
    Accepted,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueHistoryItem {
    pub stmt: Statement,
    #[serde(default)]
    pub results: Option<DialogueHistoryResultList>,
    pub confirm: ConfirmStatus,
}

impl DialogueHistoryItem {
    pub fn new(stmt: Statement, confirm: ConfirmStatus) -> Self {
        Self {
            stmt,
            results: None,
            confirm,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.results.is_some()
    }

    /// Two items are compatible when they report the same function.
    pub fn compatible(&self, other: &DialogueHistoryItem) -> bool {
        match (self.stmt.last_invocation(), other.stmt.last_invocation()) {
            (Some(a), Some(b)) => a.qualified_name() == b.qualified_name(),
            _ => false,
        }
    }
}

/// Strict state delta. Apart from construction, this is the ONLY way a
/// dialogue state mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    /// Act and parameter always move together.
    SetAct {
        act: DialogueAct,
        param: Option<Vec<String>>,
    },
    Confirm { index: usize, status: ConfirmStatus },
    RecordResults {
        index: usize,
        results: DialogueHistoryResultList,
    },
    SetParam { index: usize, name: String, value: Value },
    Push(DialogueHistoryItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueState {
    policy: PolicyKind,
    dialogue_act: DialogueAct,
    #[serde(default)]
    dialogue_act_param: Option<Vec<String>>,
    #[serde(default)]
    history: Vec<DialogueHistoryItem>,
}

impl DialogueState {
    pub fn new(
        policy: PolicyKind,
        dialogue_act: DialogueAct,
        dialogue_act_param: Option<Vec<String>>,
        history: Vec<DialogueHistoryItem>,
    ) -> Self {
        Self {
            policy,
            dialogue_act,
            dialogue_act_param,
            history,
        }
    }

    pub fn policy(&self) -> PolicyKind {
        self.policy
    }

    pub fn dialogue_act(&self) -> DialogueAct {
        self.dialogue_act
    }

    pub fn dialogue_act_param(&self) -> Option<&[String]> {
        self.dialogue_act_param.as_deref()
    }

    pub fn history(&self) -> &[DialogueHistoryItem] {
        &self.history
    }

    /// First item that has not been executed yet.
    pub fn next_index(&self) -> Option<usize> {
        self.history.iter().position(|item| !item.is_executed())
    }

    pub fn next(&self) -> Option<&DialogueHistoryItem> {
        self.next_index().map(|i| &self.history[i])
    }

    /// Last item carrying results.
    pub fn current(&self) -> Option<&DialogueHistoryItem> {
        self.history.iter().rev().find(|item| item.is_executed())
    }

    pub fn set_act(&mut self, act: DialogueAct, param: Option<Vec<String>>) {
        self.reduce(StateDelta::SetAct { act, param });
    }

    pub fn reduce(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::SetAct { act, param } => {
                self.dialogue_act = act;
                self.dialogue_act_param = param;
            }
            StateDelta::Confirm { index, status } => match self.history.get_mut(index) {
                Some(item) => item.confirm = status,
                None => warn!(index, "confirm delta out of range"),
            },
            StateDelta::RecordResults { index, results } => match self.history.get_mut(index) {
                Some(item) => item.results = Some(results),
                None => warn!(index, "results delta out of range"),
            },
            StateDelta::SetParam { index, name, value } => {
                let Some(item) = self.history.get_mut(index) else {
                    warn!(index, "param delta out of range");
                    return;
                };
                let param = item
                    .stmt
                    .invocations_mut()
                    .flat_map(|inv| inv.in_params.iter_mut())
                    .find(|p| p.name == name);
                match param {
                    Some(p) => p.value = value,
                    None => warn!(index, %name, "no such parameter"),
                }
            }
            StateDelta::Push(item) => self.history.push(item),
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$dialogue @{}.{}", self.policy.name(), self.dialogue_act)?;
        if let Some(param) = &self.dialogue_act_param {
            write!(f, "({})", param.join(", "))?;
        }
        writeln!(f, ";")?;
        for item in &self.history {
            write!(f, "{} #[confirm={:?}]", item.stmt, item.confirm)?;
            if let Some(results) = &item.results {
                write!(f, " #[count={}] #[more={}]", results.count, results.more)?;
                if let Some(error) = &results.error {
                    write!(f, " #[error={}]", error)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
