use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

use super::types::Type;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display: Option<String>,
}

/// A typed ThingTalk value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Boolean(bool),
    String(String),
    Number(f64),
    Measure { value: f64, unit: String },
    Currency { value: f64, code: String },
    /// `value` is `None` while the entity is only known by its display name
    /// and still has to be disambiguated.
    Entity {
        value: Option<String>,
        kind: String,
        display: Option<String>,
    },
    Enum(String),
    Date(DateTime<Utc>),
    Time { hour: u32, minute: u32, second: u32 },
    Location(Location),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// Slot the user has not filled yet.
    Undefined,
}

impl Value {
    pub fn get_type(&self) -> Type {
        match self {
            Value::Boolean(_) => Type::Boolean,
            Value::String(_) => Type::String,
            Value::Number(_) => Type::Number,
            Value::Measure { unit, .. } => Type::Measure(unit.clone()),
            Value::Currency { .. } => Type::Currency,
            Value::Entity { kind, .. } => Type::Entity(kind.clone()),
            Value::Enum(v) => Type::Enum(vec![v.clone()]),
            Value::Date(_) => Type::Date,
            Value::Time { .. } => Type::Time,
            Value::Location(_) => Type::Location,
            Value::Array(items) => Type::Array(Box::new(
                items.first().map(Value::get_type).unwrap_or(Type::Any),
            )),
            Value::Object(_) => Type::Compound(String::new()),
            Value::Undefined => Type::Any,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Entity known only by its display name.
    pub fn is_unresolved_entity(&self) -> bool {
        matches!(self, Value::Entity { value: None, .. })
    }

    /// Convert a raw JSON value according to a declared type.
    /// Shapes that do not fit the declared type fall back to inference.
    pub fn from_json(ty: &Type, raw: &Json) -> Value {
        convert(ty, raw).unwrap_or_else(|| Value::infer(raw))
    }

    /// Total conversion driven by the raw shape alone.
    pub fn infer(raw: &Json) -> Value {
        match raw {
            Json::Null => Value::Undefined,
            Json::Bool(b) => Value::Boolean(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::Array(items.iter().map(Value::infer).collect()),
            Json::Object(_) => {
                if let Some(v) = currency_from(raw, None) {
                    return v;
                }
                if let Some(v) = time_from(raw) {
                    return v;
                }
                if let Some(v) = location_from(raw) {
                    return v;
                }
                if let Some(v) = entity_from(raw, "") {
                    return v;
                }
                Value::Object(object_from(raw))
            }
        }
    }
}

/// Which wrapper type a raw JSON object stands for, if any.
pub fn wrapper_type(raw: &Json) -> Option<Type> {
    if !raw.is_object() {
        return None;
    }
    if currency_from(raw, None).is_some() {
        Some(Type::Currency)
    } else if time_from(raw).is_some() {
        Some(Type::Time)
    } else if location_from(raw).is_some() {
        Some(Type::Location)
    } else if entity_from(raw, "").is_some() {
        Some(Type::Entity(String::new()))
    } else {
        None
    }
}

fn convert(ty: &Type, raw: &Json) -> Option<Value> {
    match ty {
        Type::Any => Some(Value::infer(raw)),
        Type::Boolean => raw.as_bool().map(Value::Boolean),
        Type::String => match raw {
            Json::String(s) => Some(Value::String(s.clone())),
            Json::Number(n) => Some(Value::String(n.to_string())),
            Json::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        // Numbers never fall back: aggregates rely on Number being total.
        Type::Number => Some(Value::Number(number_from(raw).unwrap_or(f64::NAN))),
        Type::Measure(unit) => match raw {
            Json::Object(obj) => {
                let value = obj.get("value").and_then(Json::as_f64)?;
                let unit = obj
                    .get("unit")
                    .and_then(Json::as_str)
                    .unwrap_or(unit)
                    .to_string();
                Some(Value::Measure { value, unit })
            }
            _ => number_from(raw).map(|value| Value::Measure {
                value,
                unit: unit.clone(),
            }),
        },
        Type::Currency => match raw {
            Json::Number(n) => n.as_f64().map(|value| Value::Currency {
                value,
                code: "usd".to_string(),
            }),
            _ => currency_from(raw, Some("usd")),
        },
        Type::Entity(kind) => match raw {
            Json::String(s) => Some(Value::Entity {
                value: Some(s.clone()),
                kind: kind.clone(),
                display: None,
            }),
            _ => entity_from(raw, kind),
        },
        Type::Enum(_) => raw.as_str().map(|s| Value::Enum(s.to_string())),
        Type::Date => match raw {
            Json::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| Value::Date(d.with_timezone(&Utc))),
            Json::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .map(Value::Date),
            _ => None,
        },
        Type::Time => match raw {
            Json::String(s) => time_from_str(s),
            _ => time_from(raw),
        },
        Type::Location => location_from(raw),
        Type::Array(elem) => raw
            .as_array()
            .map(|items| Value::Array(items.iter().map(|x| Value::from_json(elem, x)).collect())),
        Type::Compound(_) => raw.is_object().then(|| Value::Object(object_from(raw))),
    }
}

fn number_from(raw: &Json) -> Option<f64> {
    match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        Json::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn object_from(raw: &Json) -> BTreeMap<String, Value> {
    raw.as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), Value::infer(v)))
                .collect()
        })
        .unwrap_or_default()
}

fn currency_from(raw: &Json, default_code: Option<&str>) -> Option<Value> {
    let obj = raw.as_object()?;
    let value = obj.get("value").and_then(Json::as_f64)?;
    let code = obj
        .get("code")
        .and_then(Json::as_str)
        .or(default_code)?
        .to_string();
    Some(Value::Currency { value, code })
}

fn time_from(raw: &Json) -> Option<Value> {
    let obj = raw.as_object()?;
    let hour = obj.get("hour").and_then(Json::as_u64)? as u32;
    let minute = obj.get("minute").and_then(Json::as_u64)? as u32;
    let second = obj.get("second").and_then(Json::as_u64).unwrap_or(0) as u32;
    Some(Value::Time {
        hour,
        minute,
        second,
    })
}

fn time_from_str(s: &str) -> Option<Value> {
    let mut parts = s.split(':').map(|p| p.trim().parse::<u32>());
    let hour = parts.next()?.ok()?;
    let minute = parts.next()?.ok()?;
    let second = match parts.next() {
        Some(p) => p.ok()?,
        None => 0,
    };
    Some(Value::Time {
        hour,
        minute,
        second,
    })
}

fn location_from(raw: &Json) -> Option<Value> {
    let obj = raw.as_object()?;
    let latitude = obj
        .get("latitude")
        .or_else(|| obj.get("y"))
        .and_then(Json::as_f64)?;
    let longitude = obj
        .get("longitude")
        .or_else(|| obj.get("x"))
        .and_then(Json::as_f64)?;
    let display = obj
        .get("display")
        .and_then(Json::as_str)
        .map(str::to_string);
    Some(Value::Location(Location {
        latitude,
        longitude,
        display,
    }))
}

fn entity_from(raw: &Json, kind: &str) -> Option<Value> {
    let obj = raw.as_object()?;
    let value = obj.get("value").and_then(Json::as_str)?.to_string();
    // anything beyond value/display is a record, not an entity
    if obj.keys().any(|k| k != "value" && k != "display") {
        return None;
    }
    let display = obj
        .get("display")
        .and_then(Json::as_str)
        .map(str::to_string);
    Some(Value::Entity {
        value: Some(value),
        kind: kind.to_string(),
        display,
    })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(true) => write!(f, "yes"),
            Value::Boolean(false) => write!(f, "no"),
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Measure { value, unit } => write!(f, "{} {}", value, unit),
            Value::Currency { value, code } => write!(f, "{:.2} {}", value, code.to_uppercase()),
            Value::Entity { value, display, .. } => match (display, value) {
                (Some(d), _) => write!(f, "{}", d),
                (None, Some(v)) => write!(f, "{}", v),
                (None, None) => write!(f, "?"),
            },
            Value::Enum(v) => write!(f, "{}", v.replace('_', " ")),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Value::Time {
                hour,
                minute,
                second,
            } => {
                if *second == 0 {
                    write!(f, "{:02}:{:02}", hour, minute)
                } else {
                    write!(f, "{:02}:{:02}:{:02}", hour, minute, second)
                }
            }
            Value::Location(loc) => match &loc.display {
                Some(d) => write!(f, "{}", d),
                None => write!(f, "[{:.3}, {:.3}]", loc.latitude, loc.longitude),
            },
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            Value::Object(fields) => {
                let parts: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{ {} }}", parts.join(", "))
            }
            Value::Undefined => write!(f, "?"),
        }
    }
}
