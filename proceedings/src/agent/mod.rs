//! Agent adapter: the capability an AI-driven participant exposes.
//!
//! The engine only ever sees [`Agent`]: which model, which backend pool,
//! or whether a human is typing is an implementation detail behind it.
//! A failed `generate_statement` never stops a trial; the engine records
//! [`fallback_statement`] in its place.

pub mod context;
pub mod human;
pub mod persona;
pub mod scripted;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::case::{ParticipantId, Role};
use crate::engine::ActionType;

pub use context::PromptContext;
pub use human::{HumanAgent, HumanInput};
pub use persona::PersonaAgent;
pub use scripted::ScriptedAgent;

/// Errors an agent can report for a single call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Agent returned an empty response")]
    EmptyResponse,
}

/// Result type for agent calls.
pub type AgentResult<T> = Result<T, AgentError>;

/// Capability interface of an AI (or human) participant.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Feed context into the agent's reasoning trace. Never surfaced in the transcript.
    async fn think(&self, context: &str);

    /// Produce the participant's next utterance.
    async fn generate_statement(&self, prompt: &str) -> AgentResult<String>;

    /// Whether a human supplies this agent's statements.
    fn is_interactive(&self) -> bool {
        false
    }
}

/// Text recorded when an agent cannot produce a statement.
pub fn fallback_statement(role: Role, action: ActionType, instruction: &str) -> String {
    format!("[{} {}] - {}", role, action, instruction)
}

/// Binding of participants to their agents.
#[derive(Clone, Default)]
pub struct AgentRoster {
    agents: HashMap<ParticipantId, Arc<dyn Agent>>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `agent` to a participant, replacing any previous binding.
    pub fn bind(&mut self, participant_id: impl Into<String>, agent: Arc<dyn Agent>) {
        self.agents.insert(participant_id.into(), agent);
    }

    pub fn with(mut self, participant_id: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        self.bind(participant_id, agent);
        self
    }

    pub fn get(&self, participant_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(participant_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.agents.keys().collect();
        ids.sort();
        f.debug_struct("AgentRoster").field("bound", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_format() {
        let text = fallback_statement(Role::Prosecutor, ActionType::OpeningStatement, "Open the case");
        assert_eq!(text, "[prosecutor opening-statement] - Open the case");
    }

    #[test]
    fn test_roster_binding() {
        let roster = AgentRoster::new()
            .with("p1", Arc::new(ScriptedAgent::constant("OK")))
            .with("d1", Arc::new(ScriptedAgent::constant("Objection")));
        assert_eq!(roster.len(), 2);
        assert!(roster.get("p1").is_some());
        assert!(roster.get("nobody").is_none());
        assert!(format!("{:?}", roster).contains("d1"));
    }
}
