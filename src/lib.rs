//! Dialogue core of a virtual assistant: a FIFO of user turns and background
//! notifications, a policy deciding the agent's next act, and a statement
//! executor turning app output into typed, paginated results.

pub mod ast;
pub mod config;
pub mod dialogue;
pub mod entity;
pub mod error;
pub mod executor;
pub mod outputs;
pub mod policy;
pub mod schema;
pub mod telemetry;

pub use config::AgentConfig;
pub use dialogue::{DialogueHandle, DialogueLoop};
pub use error::{AgentError, Result};
