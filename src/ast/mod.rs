//! Consumed ThingTalk boundary.
//!
//! Only the node shapes the dialogue core pattern-matches on are modelled:
//! typed values, function schemas, invocations and the two statement kinds.
//! Parsing and typechecking happen upstream.

pub mod program;
pub mod types;
pub mod value;

pub use program::{Command, FunctionDef, FunctionType, InputParam, Invocation, Program, Rule, Statement};
pub use types::Type;
pub use value::{Location, Value};
