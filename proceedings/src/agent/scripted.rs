//! Canned-response agent for offline runs and tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Agent, AgentError, AgentResult};

/// Replays a fixed list of responses, cycling when exhausted.
#[derive(Debug)]
pub struct ScriptedAgent {
    responses: Vec<String>,
    /// Zero-based call indices that fail.
    failures: HashSet<usize>,
    always_fail: bool,
    latency: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    thoughts: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            failures: HashSet::new(),
            always_fail: false,
            latency: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            thoughts: Mutex::new(Vec::new()),
        }
    }

    /// Every call returns `text`.
    pub fn constant(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    /// Every call fails with a backend error.
    pub fn failing() -> Self {
        let mut agent = Self::new(Vec::new());
        agent.always_fail = true;
        agent
    }

    /// Fail the `call`-th request (zero-based).
    pub fn failing_on(mut self, call: usize) -> Self {
        self.failures.insert(call);
        self
    }

    /// Sleep before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn thoughts(&self) -> Vec<String> {
        self.thoughts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn think(&self, context: &str) {
        if let Ok(mut t) = self.thoughts.lock() {
            t.push(context.to_string());
        }
    }

    async fn generate_statement(&self, prompt: &str) -> AgentResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.always_fail || self.failures.contains(&call) {
            return Err(AgentError::Backend(format!("scripted failure on call {call}")));
        }
        if self.responses.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(self.responses[call % self.responses.len()].clone())
    }
}
