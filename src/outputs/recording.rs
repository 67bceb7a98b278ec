use async_trait::async_trait;

use super::{ConversationDelegate, TurnOutput};
use crate::policy::ValueCategory;

#[derive(Debug, Clone, PartialEq)]
pub enum DelegateEvent {
    Reply { message: String, icon: Option<String> },
    Turn(TurnOutput),
    Expect(Option<ValueCategory>),
}

/// Delegate that keeps every event in order.
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    pub events: Vec<DelegateEvent>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DelegateEvent::Reply { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn turns(&self) -> Vec<&TurnOutput> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DelegateEvent::Turn(turn) => Some(turn),
                _ => None,
            })
            .collect()
    }

    pub fn last_expected(&self) -> Option<&Option<ValueCategory>> {
        self.events.iter().rev().find_map(|e| match e {
            DelegateEvent::Expect(expect) => Some(expect),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[async_trait]
impl ConversationDelegate for RecordingDelegate {
    async fn reply(&mut self, message: &str, icon: Option<&str>) -> anyhow::Result<()> {
        self.events.push(DelegateEvent::Reply {
            message: message.to_string(),
            icon: icon.map(str::to_string),
        });
        Ok(())
    }

    async fn on_turn(&mut self, turn: &TurnOutput) -> anyhow::Result<()> {
        self.events.push(DelegateEvent::Turn(turn.clone()));
        Ok(())
    }

    async fn set_expected(&mut self, expect: Option<&ValueCategory>) -> anyhow::Result<()> {
        self.events.push(DelegateEvent::Expect(expect.cloned()));
        Ok(())
    }
}
