//! Model backends behind persona agents
//!
//! The engine never talks to these directly. A [`PersonaAgent`](crate::agent::PersonaAgent)
//! holds an `Arc<dyn ModelBackend>`, which is either a single HTTP backend or a
//! [`BackendPool`] spreading requests over several instances.

pub mod batch;
pub mod http;
pub mod pool;

use async_trait::async_trait;
use thiserror::Error;

pub use batch::{generate_batch, DEFAULT_BATCH_CONCURRENCY};
pub use http::OllamaBackend;
pub use pool::{BackendPool, InstanceStatus, PoolError, PoolLease};

/// Errors from model backends
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A text-generation service.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Name used in logs and status output
    fn name(&self) -> String;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> BackendResult<String>;

    /// Whether the backend currently answers.
    async fn health_check(&self) -> bool;
}
