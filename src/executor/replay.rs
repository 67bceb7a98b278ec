use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::runtime::{App, AppFactory, AppOutput};
use crate::ast::Program;
use crate::error::Result;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub enum ReplaySource {
    Finite(Vec<AppOutput>),
    /// Continuous source: repeats until the consumer stops reading.
    Repeat(AppOutput),
}

/// Simulated runtime that replays canned outputs per `kind:function`.
///
/// The function is taken from the last invocation of the program's first
/// statement. Unregistered functions fail construction.
#[derive(Debug, Clone, Default)]
pub struct ReplayAppFactory {
    sources: HashMap<String, ReplaySource>,
}

impl ReplayAppFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, function: &str, outputs: Vec<AppOutput>) {
        self.sources
            .insert(function.to_string(), ReplaySource::Finite(outputs));
    }

    pub fn register_continuous(&mut self, function: &str, output: AppOutput) {
        self.sources
            .insert(function.to_string(), ReplaySource::Repeat(output));
    }

    pub fn with(mut self, function: &str, outputs: Vec<AppOutput>) -> Self {
        self.register(function, outputs);
        self
    }
}

#[async_trait]
impl AppFactory for ReplayAppFactory {
    async fn create_app(&self, program: Program) -> Result<Option<App>> {
        let Some(invocation) = program
            .statements
            .first()
            .and_then(|stmt| stmt.last_invocation())
        else {
            return Ok(None);
        };

        let function = invocation.qualified_name();
        let Some(source) = self.sources.get(&function).cloned() else {
            debug!(%function, "no replay registered");
            return Ok(None);
        };

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            match source {
                ReplaySource::Finite(outputs) => {
                    for output in outputs {
                        if tx.send(output).await.is_err() {
                            break;
                        }
                    }
                }
                ReplaySource::Repeat(output) => {
                    while tx.send(output.clone()).await.is_ok() {}
                }
            }
        });

        Ok(Some(App {
            unique_id: format!("uuid-{}", Uuid::new_v4()),
            name: invocation.channel.clone(),
            icon: Some(invocation.kind.clone()),
            main_output: rx,
        }))
    }
}
