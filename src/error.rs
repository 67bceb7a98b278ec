use thiserror::Error;

/// Errors raised by the dialogue core.
///
/// Domain errors reported by a running app are NOT here: those are data
/// (see `executor::runtime::ExecutionError`) and travel inside the result list.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no schema for {kind}:{function}")]
    SchemaNotFound { kind: String, function: String },

    #[error("invalid output type `{0}`")]
    InvalidOutputType(String),

    #[error("invalid type `{0}`")]
    InvalidType(String),

    #[error("failed to fetch schema: {0}")]
    SchemaFetch(String),

    #[error("choose_action invoked on the null policy")]
    NullPolicyAction,

    #[error("unknown dialogue policy `{0}`")]
    UnknownPolicy(String),

    #[error("invalid dialogue state: {0}")]
    InvalidState(String),

    /// The user stopped the current dialogue.
    #[error("cancelled")]
    Cancelled,

    #[error("delegate failure: {0}")]
    Delegate(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::SchemaFetch(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
