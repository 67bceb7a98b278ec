use async_trait::async_trait;
use reqwest::{Client, Request};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::SchemaRetriever;
use crate::ast::{FunctionDef, FunctionType, Type};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};

#[derive(Deserialize)]
struct SchemaResponse {
    result: String,
    #[serde(default)]
    data: HashMap<String, RawClass>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawClass {
    #[serde(default)]
    queries: HashMap<String, RawFunction>,
    #[serde(default)]
    actions: HashMap<String, RawFunction>,
}

#[derive(Deserialize)]
struct RawFunction {
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    confirm: Option<bool>,
    #[serde(default)]
    require_either: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct ClassSchema {
    queries: HashMap<String, Arc<FunctionDef>>,
    actions: HashMap<String, Arc<FunctionDef>>,
}

/// Schema retriever backed by the Thingpedia HTTP API.
///
/// Classes are fetched whole and cached per kind; concurrent lookups for a
/// kind that is not cached yet may each hit the network once.
#[derive(Clone)]
pub struct ThingpediaSchemaRetriever {
    client: Client,
    base_url: String,
    developer_key: Option<String>,
    locale: String,
    cache: Arc<RwLock<HashMap<String, Arc<ClassSchema>>>>,
}

impl ThingpediaSchemaRetriever {
    /// Fails if the HTTP client cannot be built with the configured timeout.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.schema_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.thingpedia_url.trim_end_matches('/').to_string(),
            developer_key: config.developer_key.clone(),
            locale: config.locale.clone(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// `GET {base}/api/v3/schema/{kind}?locale=..[&developer_key=..]`
    fn schema_request(&self, kind: &str) -> Result<Request> {
        let mut request = self
            .client
            .get(format!("{}/api/v3/schema/{}", self.base_url, kind))
            .query(&[("locale", &self.locale)]);
        if let Some(key) = &self.developer_key {
            request = request.query(&[("developer_key", key)]);
        }
        Ok(request.build()?)
    }

    async fn get_class(&self, kind: &str) -> Result<Arc<ClassSchema>> {
        if let Some(class) = self.cache.read().await.get(kind) {
            debug!(kind, "schema cache hit");
            return Ok(class.clone());
        }
        debug!(kind, "schema cache miss");

        let request = self.schema_request(kind)?;
        let response = self.client.execute(request).await?;
        if !response.status().is_success() {
            return Err(AgentError::SchemaFetch(format!(
                "Thingpedia returned {}",
                response.status()
            )));
        }

        let body: SchemaResponse = response.json().await?;
        if body.result != "ok" {
            return Err(AgentError::SchemaFetch(
                body.error.unwrap_or_else(|| "unexpected response".to_string()),
            ));
        }

        let raw = body.data.into_iter().find(|(k, _)| k == kind).map(|(_, c)| c);
        let class = match raw {
            Some(raw) => Arc::new(parse_class(kind, raw)?),
            None => {
                warn!(kind, "Thingpedia has no class");
                return Err(AgentError::SchemaNotFound {
                    kind: kind.to_string(),
                    function: String::new(),
                });
            }
        };

        self.cache
            .write()
            .await
            .insert(kind.to_string(), class.clone());
        Ok(class)
    }
}

fn parse_class(kind: &str, raw: RawClass) -> Result<ClassSchema> {
    let mut class = ClassSchema::default();
    for (name, f) in raw.queries {
        let def = parse_function(kind, &name, FunctionType::Query, f)?;
        class.queries.insert(name, Arc::new(def));
    }
    for (name, f) in raw.actions {
        let def = parse_function(kind, &name, FunctionType::Action, f)?;
        class.actions.insert(name, Arc::new(def));
    }
    Ok(class)
}

fn parse_function(kind: &str, name: &str, function_type: FunctionType, raw: RawFunction) -> Result<FunctionDef> {
    if raw.args.len() != raw.types.len() {
        return Err(AgentError::SchemaFetch(format!(
            "{}:{} has {} args but {} types",
            kind,
            name,
            raw.args.len(),
            raw.types.len()
        )));
    }

    let mut args = BTreeMap::new();
    for (arg, ty) in raw.args.into_iter().zip(raw.types) {
        args.insert(arg, ty.parse::<Type>()?);
    }

    Ok(FunctionDef {
        kind: kind.to_string(),
        name: name.to_string(),
        function_type,
        args,
        confirm: raw.confirm,
        require_either: raw.require_either,
    })
}

#[async_trait]
impl SchemaRetriever for ThingpediaSchemaRetriever {
    async fn get_schema_and_names(
        &self,
        kind: &str,
        function_type: FunctionType,
        name: &str,
    ) -> Result<Arc<FunctionDef>> {
        let class = self.get_class(kind).await?;
        let table = match function_type {
            FunctionType::Query => &class.queries,
            FunctionType::Action => &class.actions,
        };
        table.get(name).cloned().ok_or_else(|| AgentError::SchemaNotFound {
            kind: kind.to_string(),
            function: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_request_carries_locale_and_key() {
        let config = AgentConfig {
            thingpedia_url: "https://thingpedia.example.org/thingpedia/".to_string(),
            developer_key: Some("abc".to_string()),
            locale: "it-IT".to_string(),
            ..AgentConfig::default()
        };
        let retriever = ThingpediaSchemaRetriever::new(&config).unwrap();

        let request = retriever.schema_request("com.yelp").unwrap();
        assert_eq!(request.url().path(), "/thingpedia/api/v3/schema/com.yelp");
        assert_eq!(request.url().query(), Some("locale=it-IT&developer_key=abc"));
    }

    #[test]
    fn test_default_locale_is_sent() {
        let retriever = ThingpediaSchemaRetriever::new(&AgentConfig::default()).unwrap();
        let request = retriever.schema_request("com.twitter").unwrap();
        assert_eq!(request.url().query(), Some("locale=en-US"));
    }
}
