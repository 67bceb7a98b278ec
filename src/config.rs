use serde::Deserialize;

use crate::error::{AgentError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the Thingpedia instance serving schemas.
    pub thingpedia_url: String,
    pub developer_key: Option<String>,
    pub locale: String,
    /// Capacity of the channel feeding the dialogue queue.
    pub queue_capacity: usize,
    pub schema_timeout_ms: u64,
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            thingpedia_url: "https://thingpedia.stanford.edu/thingpedia".to_string(),
            developer_key: None,
            locale: "en-US".to_string(),
            queue_capacity: 100,
            schema_timeout_ms: 5000,
            debug: false,
        }
    }
}

impl AgentConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| AgentError::InvalidState(format!("bad config: {}", e)))
    }

    /// Defaults overlaid with `ALMOND_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ALMOND_THINGPEDIA_URL") {
            config.thingpedia_url = url;
        }
        if let Ok(key) = std::env::var("ALMOND_DEVELOPER_KEY") {
            config.developer_key = Some(key);
        }
        if let Ok(locale) = std::env::var("ALMOND_LOCALE") {
            config.locale = locale;
        }
        if let Ok(debug) = std::env::var("ALMOND_DEBUG") {
            config.debug = matches!(debug.as_str(), "1" | "true" | "yes");
        }
        config
    }
}
