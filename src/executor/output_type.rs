use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::ast::FunctionType;
use crate::error::{AgentError, Result};

static AGGREGATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z]+)\(([^)]+)\)$").expect("static regex"));

const ACTION_PREFIX: &str = "action/";

/// `kind:function`, with `action/`-prefixed names denoting actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    pub kind: String,
    pub function_type: FunctionType,
    pub name: String,
}

impl FunctionRef {
    pub fn parse(tag: &str) -> Result<Self> {
        let (kind, fname) = tag
            .split_once(':')
            .filter(|(k, f)| !k.is_empty() && !f.is_empty())
            .ok_or_else(|| AgentError::InvalidOutputType(tag.to_string()))?;

        let (function_type, name) = match fname.strip_prefix(ACTION_PREFIX) {
            Some(action) => (FunctionType::Action, action),
            None => (FunctionType::Query, fname),
        };
        Ok(Self {
            kind: kind.to_string(),
            function_type,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function_type {
            FunctionType::Query => write!(f, "{}:{}", self.kind, self.name),
            FunctionType::Action => write!(f, "{}:{}{}", self.kind, ACTION_PREFIX, self.name),
        }
    }
}

/// Output type tag attached to every result an app produces, parsed once at
/// the runtime boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputType {
    Plain(FunctionRef),
    /// `operator(inner)`. `inner` is `None` when the argument is not a
    /// `kind:function` tag, as in `count(x)`.
    Aggregate {
        operator: String,
        inner: Option<FunctionRef>,
    },
    /// `a+b+c`: a derivation chain. Only the last link is authoritative.
    Chained(Vec<OutputType>),
}

impl OutputType {
    pub fn parse(tag: &str) -> Result<Self> {
        if tag.contains('+') {
            let links = tag
                .split('+')
                .map(Self::parse_link)
                .collect::<Result<Vec<_>>>()?;
            return Ok(OutputType::Chained(links));
        }
        Self::parse_link(tag)
    }

    fn parse_link(tag: &str) -> Result<Self> {
        if let Some(caps) = AGGREGATION.captures(tag) {
            return Ok(OutputType::Aggregate {
                operator: caps[1].to_string(),
                inner: FunctionRef::parse(&caps[2]).ok(),
            });
        }
        FunctionRef::parse(tag).map(OutputType::Plain)
    }

    /// The link that decides how values are typed.
    pub fn authoritative(&self) -> &OutputType {
        match self {
            OutputType::Chained(links) => links.last().map(|l| l.authoritative()).unwrap_or(self),
            _ => self,
        }
    }
}
