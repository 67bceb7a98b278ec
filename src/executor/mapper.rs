use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::output_type::{FunctionRef, OutputType};
use crate::ast::value::wrapper_type;
use crate::ast::{FunctionDef, Type, Value};
use crate::error::Result;
use crate::schema::SchemaRetriever;

/// Fields with this name are always distances in meters, whatever the
/// schema or the raw value says.
pub const DISTANCE_FIELD: &str = "distance";
const DISTANCE_UNIT: &str = "m";
const DEVICE_FIELD: &str = "__device";
const COUNT_OPERATOR: &str = "count";

pub type MappedResult = BTreeMap<String, Value>;

/// Local type inference for fields the schema does not describe.
pub fn infer_type(key: &str, raw: &Json) -> Type {
    if key == DISTANCE_FIELD {
        return Type::Measure(DISTANCE_UNIT.to_string());
    }
    if key == DEVICE_FIELD {
        return Type::Entity("tt:device_id".to_string());
    }
    match raw {
        Json::Bool(_) => Type::Boolean,
        Json::String(_) => Type::String,
        Json::Number(_) => Type::Number,
        Json::Array(items) => match items.first() {
            Some(first) => Type::Array(Box::new(infer_type(key, first))),
            None => Type::Array(Box::new(Type::Any)),
        },
        Json::Object(_) => wrapper_type(raw).unwrap_or(Type::Any),
        Json::Null => Type::Any,
    }
}

/// Converts raw key/value records produced by apps into typed records.
#[derive(Clone)]
pub struct ResultMapper {
    schemas: Arc<dyn SchemaRetriever>,
}

impl ResultMapper {
    pub fn new(schemas: Arc<dyn SchemaRetriever>) -> Self {
        Self { schemas }
    }

    pub async fn map_result(&self, output_type: Option<&str>, output_value: &Map<String, Json>) -> Result<MappedResult> {
        let Some(tag) = output_type else {
            return Ok(map_fields(None, "", output_value));
        };

        match OutputType::parse(tag) {
            Ok(parsed) => self.map_typed(&parsed, output_value).await,
            Err(e) => {
                warn!("{}, typing result by inference", e);
                Ok(map_fields(None, "", output_value))
            }
        }
    }

    pub async fn map_typed(&self, output_type: &OutputType, output_value: &Map<String, Json>) -> Result<MappedResult> {
        match output_type.authoritative() {
            OutputType::Aggregate { operator, .. } if operator == COUNT_OPERATOR => Ok(output_value
                .iter()
                .filter(|(_, raw)| !raw.is_null())
                .map(|(key, raw)| (key.clone(), Value::from_json(&Type::Number, raw)))
                .collect()),
            OutputType::Aggregate { inner: Some(inner), .. } => {
                let schema = self.schema_for(inner).await?;
                Ok(map_fields(Some(&schema), "", output_value))
            }
            OutputType::Aggregate { operator, inner: None } => {
                debug!(%operator, "aggregate over an unknown function, typing result by inference");
                Ok(map_fields(None, "", output_value))
            }
            OutputType::Plain(function) => {
                let schema = self.schema_for(function).await?;
                Ok(map_fields(Some(&schema), "", output_value))
            }
            // authoritative() never returns a chain
            OutputType::Chained(_) => Ok(map_fields(None, "", output_value)),
        }
    }

    async fn schema_for(&self, function: &FunctionRef) -> Result<Arc<FunctionDef>> {
        self.schemas
            .get_schema_and_names(&function.kind, function.function_type, &function.name)
            .await
    }
}

fn map_fields(schema: Option<&FunctionDef>, prefix: &str, object: &Map<String, Json>) -> MappedResult {
    let mut mapped = BTreeMap::new();

    for (key, raw) in object {
        if raw.is_null() {
            continue;
        }

        let path = format!("{}{}", prefix, key);
        let ty = if key == DISTANCE_FIELD {
            Type::Measure(DISTANCE_UNIT.to_string())
        } else {
            schema
                .and_then(|s| s.get_arg_type(&path))
                .cloned()
                .unwrap_or_else(|| infer_type(key, raw))
        };

        let value = match (ty.is_compound(), raw.as_object()) {
            (true, Some(fields)) => Value::Object(map_fields(schema, &format!("{}.", path), fields)),
            _ if key == DISTANCE_FIELD => distance_from(raw),
            _ => Value::from_json(&ty, raw),
        };
        mapped.insert(key.clone(), value);
    }

    mapped
}

/// Distances never fall back to inference: an unreadable value becomes a
/// NaN measure.
fn distance_from(raw: &Json) -> Value {
    match Value::from_json(&Type::Measure(DISTANCE_UNIT.to_string()), raw) {
        measure @ Value::Measure { .. } => measure,
        _ => Value::Measure {
            value: f64::NAN,
            unit: DISTANCE_UNIT.to_string(),
        },
    }
}
