use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::ast::Program;
use crate::error::Result;

/// A domain error reported by a running app. This is data, not a failure of
/// the executor.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ExecutionError {
    /// Codes starting with `E` are reserved for system errors.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ExecutionError {
    pub fn new(code: Option<&str>, message: &str) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }
}

/// One element of an app's result stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppOutput {
    Result {
        output_type: Option<String>,
        output_value: Map<String, Json>,
    },
    Error(ExecutionError),
}

impl AppOutput {
    pub fn result(output_type: Option<&str>, output_value: Json) -> Self {
        AppOutput::Result {
            output_type: output_type.map(str::to_string),
            output_value: match output_value {
                Json::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

/// A running program instance. Dropping `main_output` stops observing the
/// app; stopping the app itself is the runtime's business.
#[derive(Debug)]
pub struct App {
    pub unique_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub main_output: mpsc::Receiver<AppOutput>,
}

/// Runtime collaborator that instantiates programs.
#[async_trait]
pub trait AppFactory: Send + Sync {
    /// `Ok(None)` means the app could not be constructed.
    async fn create_app(&self, program: Program) -> Result<Option<App>>;
}
