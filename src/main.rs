use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use almond::ast::FunctionDef;
use almond::dialogue::{DialogueHandle, DialogueLoop, QueueItem};
use almond::entity::{EntityRecord, StaticEntityLookup};
use almond::executor::{AppOutput, ReplayAppFactory, StatementExecutor};
use almond::outputs::DelegateEvent;
use almond::outputs::RecordingDelegate;
use almond::schema::{MemorySchemaRetriever, SchemaRetriever, ThingpediaSchemaRetriever};
use almond::AgentConfig;

/// Scripted conversation: schemas, canned app outputs per `kind:function`,
/// known entities and the queue items to feed, in order.
#[derive(Debug, Deserialize)]
struct ReplayScript {
    /// When empty, schemas are fetched from Thingpedia.
    #[serde(default)]
    schemas: Vec<FunctionDef>,
    #[serde(default)]
    outputs: HashMap<String, Vec<AppOutput>>,
    #[serde(default)]
    entities: Vec<EntityRecord>,
    items: Vec<QueueItem>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: almond-replay <script.json>")?;
    let config = AgentConfig::from_env();
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path))?;
    let script: ReplayScript = serde_json::from_str(&raw).context("parsing replay script")?;
    tracing::info!(items = script.items.len(), "replay script loaded");

    let schemas: Arc<dyn SchemaRetriever> = if script.schemas.is_empty() {
        Arc::new(ThingpediaSchemaRetriever::new(&config)?)
    } else {
        let mut memory = MemorySchemaRetriever::new();
        for def in script.schemas {
            memory.insert(def);
        }
        Arc::new(memory)
    };

    let mut apps = ReplayAppFactory::new();
    for (function, outputs) in script.outputs {
        apps.register(&function, outputs);
    }

    let mut entities = StaticEntityLookup::new();
    for record in script.entities {
        entities.insert(record);
    }

    let executor = StatementExecutor::new(Arc::new(apps), schemas);
    let (handle, rx) = DialogueHandle::channel(config.queue_capacity);
    let mut dialogue =
        DialogueLoop::new(rx, executor, RecordingDelegate::new()).with_entity_lookup(Arc::new(entities));

    for item in script.items {
        handle.push(item).await?;
        dialogue.process_pending().await?;
    }

    for event in &dialogue.delegate().events {
        match event {
            DelegateEvent::Reply { message, icon } => match icon {
                Some(icon) => println!(">> [{}] {}", icon, message),
                None => println!(">> {}", message),
            },
            DelegateEvent::Turn(turn) => {
                println!("-- act: {}, terminal: {}", turn.state.dialogue_act(), turn.interaction.is_terminal)
            }
            DelegateEvent::Expect(expect) => println!("-- expecting: {:?}", expect),
        }
    }

    if config.debug {
        println!("{:#?}", dialogue.telemetry().snapshot());
    }
    Ok(())
}
