use std::sync::Arc;
use tracing::{debug, info};

use super::mapper::ResultMapper;
use super::results::{DialogueHistoryResultItem, DialogueHistoryResultList, RawResult, MORE_SIZE};
use super::runtime::{App, AppFactory, AppOutput, ExecutionError};
use crate::ast::{Program, Statement, Value};
use crate::error::Result;
use crate::schema::SchemaRetriever;

/// Immutable accumulator folded over an app's result stream.
#[derive(Debug, Default)]
struct Collected {
    items: Vec<DialogueHistoryResultItem>,
    error_code: Option<String>,
    error_message: Option<String>,
    truncated: bool,
}

impl Collected {
    /// First usable code wins, first non-empty message wins.
    fn with_error(self, err: ExecutionError) -> Self {
        let error_code = self.error_code.or_else(|| err.code.filter(|c| !c.starts_with('E')));
        let error_message = self
            .error_message
            .or_else(|| Some(err.message).filter(|m| !m.is_empty()));
        Self {
            error_code,
            error_message,
            ..self
        }
    }

    fn with_item(mut self, item: DialogueHistoryResultItem) -> Self {
        self.items.push(item);
        self
    }

    fn is_full(&self) -> bool {
        self.items.len() >= MORE_SIZE
    }

    fn into_result_list(self) -> DialogueHistoryResultList {
        let error = match (self.error_code, self.error_message) {
            (Some(code), _) => Some(Value::Enum(code)),
            (None, Some(message)) => Some(Value::String(message)),
            (None, None) => None,
        };
        DialogueHistoryResultList::new(self.items, self.truncated, error)
    }
}

/// Runs single statements against the runtime and turns their output into
/// result lists.
#[derive(Clone)]
pub struct StatementExecutor {
    apps: Arc<dyn AppFactory>,
    mapper: ResultMapper,
}

impl StatementExecutor {
    pub fn new(apps: Arc<dyn AppFactory>, schemas: Arc<dyn SchemaRetriever>) -> Self {
        Self {
            apps,
            mapper: ResultMapper::new(schemas),
        }
    }

    pub fn mapper(&self) -> &ResultMapper {
        &self.mapper
    }

    pub async fn execute_statement(&self, stmt: &Statement) -> Result<DialogueHistoryResultList> {
        let program = Program::from_statement(stmt.clone());
        let app = self.apps.create_app(program).await?;

        let collected = match app {
            Some(app) => self.collect(app).await?,
            None => {
                info!("app construction failed, reporting empty results");
                Collected::default()
            }
        };

        let list = collected.into_result_list();
        info!(
            count = list.count,
            more = list.more,
            error = list.has_error(),
            "statement executed"
        );
        Ok(list)
    }

    /// Drains the app's output until it ends or a result beyond MORE_SIZE
    /// shows up. The app keeps running either way.
    async fn collect(&self, mut app: App) -> Result<Collected> {
        debug!(app = %app.unique_id, "iterating results");
        let mut acc = Collected::default();

        while let Some(output) = app.main_output.recv().await {
            acc = match output {
                AppOutput::Error(err) => acc.with_error(err),
                AppOutput::Result { .. } if acc.is_full() => {
                    acc.truncated = true;
                    break;
                }
                AppOutput::Result {
                    output_type,
                    output_value,
                } => {
                    let value = self
                        .mapper
                        .map_result(output_type.as_deref(), &output_value)
                        .await?;
                    acc.with_item(DialogueHistoryResultItem {
                        value,
                        raw: Some(RawResult {
                            output_type,
                            output_value,
                        }),
                    })
                }
            };
        }

        Ok(acc)
    }
}
