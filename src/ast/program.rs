use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::types::Type;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionType {
    Query,
    Action,
}

/// Per-function type metadata, as returned by the schema retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub kind: String,
    pub name: String,
    pub function_type: FunctionType,
    /// Argument types. Fields of compound arguments use dotted names.
    #[serde(default)]
    pub args: BTreeMap<String, Type>,
    /// Explicit `#[confirm]` annotation, if the function carries one.
    #[serde(default)]
    pub confirm: Option<bool>,
    /// Groups of input parameters of which at least one must be given.
    #[serde(default)]
    pub require_either: Vec<Vec<String>>,
}

impl FunctionDef {
    pub fn new(kind: &str, name: &str, function_type: FunctionType) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            function_type,
            args: BTreeMap::new(),
            confirm: None,
            require_either: Vec::new(),
        }
    }

    pub fn with_arg(mut self, name: &str, ty: Type) -> Self {
        self.args.insert(name.to_string(), ty);
        self
    }

    pub fn get_arg_type(&self, name: &str) -> Option<&Type> {
        self.args.get(name)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.kind, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParam {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub kind: String,
    pub channel: String,
    pub function_type: FunctionType,
    #[serde(default)]
    pub in_params: Vec<InputParam>,
    /// Attached by the typechecker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<FunctionDef>,
}

impl Invocation {
    pub fn new(kind: &str, channel: &str, function_type: FunctionType) -> Self {
        Self {
            kind: kind.to_string(),
            channel: channel.to_string(),
            function_type,
            in_params: Vec::new(),
            schema: None,
        }
    }

    pub fn with_param(mut self, name: &str, value: Value) -> Self {
        self.in_params.push(InputParam {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn with_schema(mut self, schema: FunctionDef) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.kind, self.channel)
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.in_params.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

/// `now => table => actions` (or a bare action).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub table: Option<Invocation>,
    #[serde(default)]
    pub actions: Vec<Invocation>,
}

/// `stream => actions`, a continuous program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub stream: Invocation,
    #[serde(default)]
    pub actions: Vec<Invocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Command(Command),
    Rule(Rule),
}

impl Statement {
    pub fn query(table: Invocation) -> Self {
        Statement::Command(Command {
            table: Some(table),
            actions: Vec::new(),
        })
    }

    pub fn action(action: Invocation) -> Self {
        Statement::Command(Command {
            table: None,
            actions: vec![action],
        })
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, Statement::Rule(_))
    }

    pub fn invocations(&self) -> Box<dyn Iterator<Item = &Invocation> + '_> {
        match self {
            Statement::Command(cmd) => Box::new(cmd.table.iter().chain(cmd.actions.iter())),
            Statement::Rule(rule) => Box::new(std::iter::once(&rule.stream).chain(rule.actions.iter())),
        }
    }

    pub fn invocations_mut(&mut self) -> Box<dyn Iterator<Item = &mut Invocation> + '_> {
        match self {
            Statement::Command(cmd) => Box::new(cmd.table.iter_mut().chain(cmd.actions.iter_mut())),
            Statement::Rule(rule) => {
                Box::new(std::iter::once(&mut rule.stream).chain(rule.actions.iter_mut()))
            }
        }
    }

    /// The invocation whose output the statement reports: the last action,
    /// or the query/stream when there is none.
    pub fn last_invocation(&self) -> Option<&Invocation> {
        self.invocations().last()
    }

    pub fn has_action(&self) -> bool {
        self.invocations()
            .any(|inv| inv.function_type == FunctionType::Action)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = match self {
            Statement::Command(_) => "now",
            Statement::Rule(_) => "monitor",
        };
        let parts: Vec<String> = self
            .invocations()
            .map(|inv| {
                let params: Vec<String> = inv
                    .in_params
                    .iter()
                    .map(|p| format!("{}={}", p.name, p.value))
                    .collect();
                format!("@{}.{}({})", inv.kind, inv.channel, params.join(", "))
            })
            .collect();
        write!(f, "{} => {};", head, parts.join(" => "))
    }
}

/// Minimal program container handed to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn from_statement(stmt: Statement) -> Self {
        Self {
            statements: vec![stmt],
        }
    }
}
