use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;

/// Static type of a parameter or a result field.
///
/// Serialized as the Thingpedia type string (`Measure(m)`, `Entity(tt:picture)`,
/// `Array(String)`...), so schemas can be loaded straight from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Any,
    Boolean,
    String,
    Number,
    Currency,
    Measure(String),
    Entity(String),
    Enum(Vec<String>),
    Date,
    Time,
    Location,
    Array(Box<Type>),
    /// Record type. Its fields are described in the schema by dotted names
    /// (`parent.child`), not inside the type itself.
    Compound(String),
}

impl Type {
    pub fn is_compound(&self) -> bool {
        matches!(self, Type::Compound(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "Any"),
            Type::Boolean => write!(f, "Boolean"),
            Type::String => write!(f, "String"),
            Type::Number => write!(f, "Number"),
            Type::Currency => write!(f, "Currency"),
            Type::Measure(unit) => write!(f, "Measure({})", unit),
            Type::Entity(kind) => write!(f, "Entity({})", kind),
            Type::Enum(entries) => write!(f, "Enum({})", entries.join(",")),
            Type::Date => write!(f, "Date"),
            Type::Time => write!(f, "Time"),
            Type::Location => write!(f, "Location"),
            Type::Array(elem) => write!(f, "Array({})", elem),
            Type::Compound(name) if name.is_empty() => write!(f, "Compound"),
            Type::Compound(name) => write!(f, "Compound({})", name),
        }
    }
}

impl FromStr for Type {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.find('(') {
            Some(open) => {
                if !s.ends_with(')') {
                    return Err(AgentError::InvalidType(s.to_string()));
                }
                (&s[..open], Some(&s[open + 1..s.len() - 1]))
            }
            None => (s, None),
        };

        let ty = match (name, arg) {
            ("Any", None) => Type::Any,
            ("Boolean", None) => Type::Boolean,
            ("String", None) => Type::String,
            ("Number", None) => Type::Number,
            ("Currency", None) => Type::Currency,
            ("Date", None) => Type::Date,
            ("Time", None) => Type::Time,
            ("Location", None) => Type::Location,
            ("Compound", None) => Type::Compound(String::new()),
            ("Compound", Some(n)) => Type::Compound(n.to_string()),
            ("Measure", Some(unit)) => Type::Measure(unit.to_string()),
            ("Entity", Some(kind)) => Type::Entity(kind.to_string()),
            ("Enum", Some(entries)) => {
                Type::Enum(entries.split(',').map(|e| e.trim().to_string()).collect())
            }
            ("Array", Some(elem)) => Type::Array(Box::new(elem.parse()?)),
            _ => return Err(AgentError::InvalidType(s.to_string())),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for Type {
    type Error = AgentError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Type> for String {
    fn from(t: Type) -> Self {
        t.to_string()
    }
}
