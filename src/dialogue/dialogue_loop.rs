use serde_json::{Map, Value as Json};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::input::{UiCommand, UserInput};
use super::queue::{DialogueQueue, QueueItem};
use super::state::{ConfirmStatus, DialogueAct, DialogueHistoryItem, DialogueState};
use super::utils::{compute_new_state, compute_prediction, Target};
use crate::ast::Value;
use crate::entity::EntityLookup;
use crate::error::{AgentError, Result};
use crate::executor::{DialogueHistoryResultItem, ExecutionError, RawResult, StatementExecutor};
use crate::outputs::realizer::{realize_error, realize_notification, realize_turn};
use crate::outputs::{ConversationDelegate, TurnOutput};
use crate::policy::{DialoguePolicy, PolicyKind, PolicyRegistry, TurnContext, ValueCategory};
use crate::telemetry::{QueueItemKind, TelemetryEvent, TelemetryRecorder};

/// Producer side of a dialogue. Cheap to clone; every clone feeds the same
/// FIFO.
#[derive(Debug, Clone)]
pub struct DialogueHandle {
    tx: mpsc::Sender<QueueItem>,
}

impl DialogueHandle {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<QueueItem>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Fails with `Cancelled` once the loop is gone.
    pub async fn push(&self, item: QueueItem) -> Result<()> {
        self.tx.send(item).await.map_err(|_| AgentError::Cancelled)
    }

    pub async fn handle_input(&self, intent: UserInput, confident: bool) -> Result<()> {
        self.push(QueueItem::user_input(intent, confident)).await
    }

    pub async fn notify(
        &self,
        app_id: &str,
        icon: Option<&str>,
        output_type: Option<&str>,
        output_value: Map<String, Json>,
    ) -> Result<()> {
        self.push(QueueItem::Notification {
            app_id: app_id.to_string(),
            icon: icon.map(str::to_string),
            output_type: output_type.map(str::to_string),
            output_value,
        })
        .await
    }

    pub async fn notify_error(&self, app_id: &str, icon: Option<&str>, error: ExecutionError) -> Result<()> {
        self.push(QueueItem::Error {
            app_id: app_id.to_string(),
            icon: icon.map(str::to_string),
            error,
        })
        .await
    }
}

/// Main loop of one conversation.
///
/// Items are handled strictly in arrival order and one at a time: a user
/// turn runs to completion (policy, execution, rendering) before anything
/// queued behind it is looked at.
pub struct DialogueLoop<D: ConversationDelegate> {
    receiver: mpsc::Receiver<QueueItem>,
    queue: DialogueQueue,
    policies: PolicyRegistry,
    executor: StatementExecutor,
    entities: Option<Arc<dyn EntityLookup>>,
    delegate: D,
    telemetry: TelemetryRecorder,
    state: Option<DialogueState>,
    expecting: Option<ValueCategory>,
    last_notification_app: Option<String>,
}

impl<D: ConversationDelegate> DialogueLoop<D> {
    pub fn new(receiver: mpsc::Receiver<QueueItem>, executor: StatementExecutor, delegate: D) -> Self {
        Self {
            receiver,
            queue: DialogueQueue::new(),
            policies: PolicyRegistry::new(),
            executor,
            entities: None,
            delegate,
            telemetry: TelemetryRecorder::new(),
            state: None,
            expecting: None,
            last_notification_app: None,
        }
    }

    pub fn with_entity_lookup(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.entities = Some(lookup);
        self
    }

    pub fn with_policy(mut self, kind: PolicyKind, policy: Arc<dyn DialoguePolicy>) -> Self {
        self.policies.install(kind, policy);
        self
    }

    pub fn state(&self) -> Option<&DialogueState> {
        self.state.as_ref()
    }

    pub fn expecting(&self) -> Option<&ValueCategory> {
        self.expecting.as_ref()
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    /// Handles everything already sent to the loop, then returns the number
    /// of items processed. Does not wait for new items.
    pub async fn process_pending(&mut self) -> Result<usize> {
        while let Ok(item) = self.receiver.try_recv() {
            self.queue.push(item);
        }
        self.drain_queue().await
    }

    /// Runs until `shutdown` fires or every handle is dropped.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!("dialogue loop started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("dialogue loop stopped");
                    return Ok(());
                }
                item = self.receiver.recv() => match item {
                    Some(item) => {
                        self.queue.push(item);
                        self.process_pending().await?;
                    }
                    None => {
                        info!("all dialogue handles dropped, stopping");
                        return Ok(());
                    }
                },
            }
        }
    }

    async fn drain_queue(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Some(item) = self.queue.pop() {
            self.handle_item(item).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Handles a single item. Only delegate failures escape; everything else
    /// becomes a message to the user.
    pub async fn handle_item(&mut self, item: QueueItem) -> Result<()> {
        let kind = QueueItemKind::from(&item);
        debug!(?kind, "dequeued item");
        self.telemetry.record(TelemetryEvent::QueueItem { kind });

        match item {
            QueueItem::UserInput { intent, confident } => {
                self.last_notification_app = None;
                match self.handle_user_input(intent, confident).await {
                    Ok(()) => Ok(()),
                    Err(AgentError::Delegate(e)) => Err(AgentError::Delegate(e)),
                    Err(AgentError::Cancelled) => {
                        info!("dialogue cancelled by the user");
                        self.telemetry.record(TelemetryEvent::TurnCancelled);
                        self.reset().await
                    }
                    Err(e) => {
                        warn!(error = %e, "turn failed");
                        self.telemetry.record(TelemetryEvent::TurnFailed);
                        let message = format!("Sorry, I had an error processing your command: {}.", e);
                        self.delegate.reply(&message, None).await?;
                        self.reset().await
                    }
                }
            }
            QueueItem::Notification {
                app_id,
                icon,
                output_type,
                output_value,
            } => {
                self.handle_notification(app_id, icon, output_type, output_value)
                    .await
            }
            QueueItem::Error { app_id, icon, error } => self.handle_async_error(app_id, icon, error).await,
        }
    }

    async fn handle_user_input(&mut self, intent: UserInput, confident: bool) -> Result<()> {
        match intent {
            UserInput::UiCommand { command } => self.handle_ui_command(command).await,
            UserInput::Failed { .. } => {
                self.telemetry.record(TelemetryEvent::TurnFailed);
                self.delegate
                    .reply("Sorry, I did not understand that. Can you rephrase it?", None)
                    .await?;
                Ok(())
            }
            UserInput::Unsupported => {
                self.delegate
                    .reply("Sorry, I don't know how to do that yet.", None)
                    .await?;
                Ok(())
            }
            UserInput::Answer { value } => self.handle_answer(value, confident).await,
            UserInput::MultipleChoice { index } => {
                self.handle_answer(Value::Number(index as f64), confident)
                    .await
            }
            UserInput::Program { program } => {
                let history = program
                    .statements
                    .into_iter()
                    .map(|stmt| DialogueHistoryItem::new(stmt, ConfirmStatus::Accepted))
                    .collect();
                let prediction = DialogueState::new(PolicyKind::Transaction, DialogueAct::Execute, None, history);
                self.apply_prediction(prediction, confident).await
            }
            UserInput::Prediction { state } => self.apply_prediction(state, confident).await,
        }
    }

    async fn handle_answer(&mut self, value: Value, confident: bool) -> Result<()> {
        let Some(state) = self.state.clone() else {
            return self.reject_answer().await;
        };
        let policy = self.policies.get(state.policy());
        match policy.handle_answer(&state, &value).await? {
            Some(handled) => {
                let prediction = compute_prediction(Some(&state), &handled, Target::User { auto_confirm: confident });
                self.apply_prediction(prediction, confident).await
            }
            None => self.reject_answer().await,
        }
    }

    async fn reject_answer(&mut self) -> Result<()> {
        info!("answer does not fit the dialogue, discarded");
        self.telemetry.record(TelemetryEvent::AnswerRejected);
        self.delegate.reply("Sorry, but that's not what I asked.", None).await?;
        Ok(())
    }

    /// Merges a user prediction into the current state, lets the policy act
    /// on it and reports the turn.
    async fn apply_prediction(&mut self, prediction: DialogueState, confident: bool) -> Result<()> {
        let merged = compute_new_state(
            self.state.as_ref(),
            prediction,
            Target::User {
                auto_confirm: confident,
            },
        );
        let policy = self.policies.get(merged.policy());
        info!(policy = merged.policy().name(), "choosing agent action");

        let ctx = TurnContext {
            state: &merged,
            executor: &self.executor,
            entities: self.entities.as_deref(),
            confident,
        };
        let next = policy.choose_action(&ctx).await?;

        let executed: Vec<&DialogueHistoryItem> = merged
            .history()
            .iter()
            .zip(next.history())
            .filter(|(before, after)| !before.is_executed() && after.is_executed())
            .map(|(_, after)| after)
            .collect();
        for item in &executed {
            if let Some(results) = &item.results {
                self.telemetry.record(TelemetryEvent::StatementExecuted {
                    count: results.count,
                    more: results.more,
                    errored: results.has_error(),
                });
            }
        }
        let last_executed = executed.last().copied();
        let results = last_executed.and_then(|item| item.results.clone());
        let icon = last_executed
            .and_then(|item| item.stmt.last_invocation())
            .map(|inv| inv.kind.clone());

        let act = next.dialogue_act();
        self.telemetry.record(TelemetryEvent::DialogueAct { act });
        if act == DialogueAct::Cancel {
            self.telemetry.record(TelemetryEvent::TurnCancelled);
        }

        let interaction = policy.get_interaction_state(&next);
        let turn = TurnOutput {
            message: realize_turn(&next),
            state: next.clone(),
            results,
            interaction,
        };
        self.state = Some(next);

        self.delegate.on_turn(&turn).await?;
        self.delegate.reply(&turn.message, icon.as_deref()).await?;
        self.set_expected(turn.interaction.expect.clone()).await
    }

    async fn handle_ui_command(&mut self, command: UiCommand) -> Result<()> {
        debug!(?command, "ui command");
        match command {
            UiCommand::Stop => Err(AgentError::Cancelled),
            UiCommand::NeverMind => {
                self.delegate.reply("Sorry I couldn't help on that.", None).await?;
                Err(AgentError::Cancelled)
            }
            UiCommand::Debug => {
                let rendering = match &self.state {
                    Some(state) => state.to_string(),
                    None => "No dialogue is active.".to_string(),
                };
                self.delegate.reply(&rendering, None).await?;
                Ok(())
            }
            UiCommand::WakeUp => Ok(()),
        }
    }

    async fn handle_notification(
        &mut self,
        app_id: String,
        icon: Option<String>,
        output_type: Option<String>,
        output_value: Map<String, Json>,
    ) -> Result<()> {
        let label = icon.clone().unwrap_or_else(|| app_id.clone());
        let show_header = self.last_notification_app.as_deref() != Some(app_id.as_str());

        let message = match self
            .executor
            .mapper()
            .map_result(output_type.as_deref(), &output_value)
            .await
        {
            Ok(mapped) => {
                let item = DialogueHistoryResultItem {
                    value: mapped,
                    raw: Some(RawResult {
                        output_type,
                        output_value,
                    }),
                };
                realize_notification(&label, &item, show_header)
            }
            Err(e) => {
                warn!(error = %e, "failed to map notification");
                realize_error(&label, &e.to_string())
            }
        };

        self.last_notification_app = Some(app_id);
        self.delegate.reply(&message, icon.as_deref()).await?;
        self.reset().await
    }

    async fn handle_async_error(&mut self, app_id: String, icon: Option<String>, error: ExecutionError) -> Result<()> {
        let label = icon.clone().unwrap_or_else(|| app_id.clone());
        warn!(code = ?error.code, "background app reported an error");

        self.last_notification_app = Some(app_id);
        self.delegate
            .reply(&realize_error(&label, &error.message), icon.as_deref())
            .await?;
        self.reset().await
    }

    async fn set_expected(&mut self, expect: Option<ValueCategory>) -> Result<()> {
        self.delegate.set_expected(expect.as_ref()).await?;
        self.expecting = expect;
        Ok(())
    }

    /// Drops the dialogue context and any pending expectation.
    async fn reset(&mut self) -> Result<()> {
        self.state = None;
        self.set_expected(None).await
    }
}
