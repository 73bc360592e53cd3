//! LLM-backed participant with a short rolling memory.

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{Agent, AgentError, AgentResult};
use crate::backend::ModelBackend;
use crate::case::Participant;

/// Memories kept per agent.
const MEMORY_LIMIT: usize = 50;

/// Memories rendered into each prompt.
const PROMPT_MEMORIES: usize = 5;

const DEFAULT_MAX_TOKENS: u32 = 300;

/// Leading `Name:` speaker tag, optionally bolded.
static SPEAKER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\**\s*([A-Za-z][A-Za-z .'\-]{0,60}?)\s*\**\s*:\s*")
        .expect("SPEAKER_TAG_RE regex should compile")
});

/// A participant voiced by a language model.
pub struct PersonaAgent {
    name: String,
    /// Role title, also accepted as a speaker tag to strip.
    title: String,
    persona: String,
    backend: Arc<dyn ModelBackend>,
    max_tokens: u32,
    memory: Mutex<VecDeque<String>>,
}

impl PersonaAgent {
    pub fn for_participant(participant: &Participant, backend: Arc<dyn ModelBackend>) -> Self {
        let mut persona = format!(
            "You are {}, the {} in this trial.",
            participant.name,
            participant.role.title()
        );
        if !participant.background.is_empty() {
            persona.push_str(&format!(" {}", participant.background));
        }
        persona.push_str(&format!(
            "\nYour temperament: {}.",
            participant.personality.describe()
        ));
        if !participant.knowledge.is_empty() {
            persona.push_str(&format!("\nYou know about: {}.", participant.knowledge.join(", ")));
        }
        if !participant.objectives.is_empty() {
            persona.push_str(&format!("\nYour goals: {}.", participant.objectives.join("; ")));
        }

        Self {
            name: participant.name.clone(),
            title: participant.role.title().to_string(),
            persona,
            backend,
            max_tokens: DEFAULT_MAX_TOKENS,
            memory: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Snapshot of the memory, oldest first.
    pub fn memories(&self) -> Vec<String> {
        self.memory
            .lock()
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn remember(&self, memory: String) {
        if let Ok(mut m) = self.memory.lock() {
            if m.len() == MEMORY_LIMIT {
                m.pop_front();
            }
            m.push_back(memory);
        }
    }

    fn build_prompt(&self, prompt: &str) -> String {
        let recent: Vec<String> = self
            .memory
            .lock()
            .map(|m| {
                let skip = m.len().saturating_sub(PROMPT_MEMORIES);
                m.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default();

        let mut full = self.persona.clone();
        if !recent.is_empty() {
            full.push_str("\n\nRecent memories:\n");
            full.push_str(&recent.join("\n"));
        }
        full.push_str("\n\n");
        full.push_str(prompt);
        full.push_str("\n\nRespond in character with only what you say next.");
        full
    }

    /// Strip speaker tags and surrounding quotes from model output.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut text = raw.trim();
        if let Some(caps) = SPEAKER_TAG_RE.captures(text) {
            let tag = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if tag.eq_ignore_ascii_case(&self.name) || tag.eq_ignore_ascii_case(&self.title) {
                let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
                text = text[end..].trim();
            }
        }
        text.trim_matches('"').trim().to_string()
    }
}

#[async_trait]
impl Agent for PersonaAgent {
    async fn think(&self, context: &str) {
        self.remember(format!("Heard: {}", context));
    }

    async fn generate_statement(&self, prompt: &str) -> AgentResult<String> {
        let full = self.build_prompt(prompt);
        let raw = self
            .backend
            .generate(&full, self.max_tokens)
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let text = self.sanitize(&raw);
        if text.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        debug!(agent = %self.name, backend = %self.backend.name(), chars = text.len(), "Statement generated");
        self.remember(format!("Said: {}", text));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendResult};
    use crate::case::Role;
    use mockall::mock;

    mock! {
        pub Model {}

        #[async_trait]
        impl ModelBackend for Model {
            fn name(&self) -> String;
            async fn generate(&self, prompt: &str, max_tokens: u32) -> BackendResult<String>;
            async fn health_check(&self) -> bool;
        }
    }

    fn judge() -> Participant {
        Participant::new("j1", "Judge Reyes", Role::Judge).with_background("Twenty years on the bench.")
    }

    #[tokio::test]
    async fn test_generate_strips_speaker_tag_and_remembers() {
        let mut model = MockModel::new();
        model.expect_name().return_const("mock".to_string());
        model
            .expect_generate()
            .withf(|prompt, _| prompt.contains("Judge Reyes") && prompt.contains("Heard: opening"))
            .returning(|_, _| Ok("Judge Reyes: Order in the court.".to_string()));

        let agent = PersonaAgent::for_participant(&judge(), Arc::new(model));
        agent.think("opening").await;
        let text = agent.generate_statement("Call the court to order.").await.unwrap();

        assert_eq!(text, "Order in the court.");
        assert_eq!(agent.memories(), vec!["Heard: opening", "Said: Order in the court."]);
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_agent_error() {
        let mut model = MockModel::new();
        model.expect_name().return_const("mock".to_string());
        model
            .expect_generate()
            .returning(|_, _| Err(BackendError::Request("connection refused".into())));

        let agent = PersonaAgent::for_participant(&judge(), Arc::new(model));
        let err = agent.generate_statement("Rule.").await.unwrap_err();
        assert!(matches!(err, AgentError::Backend(msg) if msg.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_empty_response_is_error() {
        let mut model = MockModel::new();
        model.expect_name().return_const("mock".to_string());
        model.expect_generate().returning(|_, _| Ok("  Judge: \"\" ".to_string()));

        let agent = PersonaAgent::for_participant(&judge(), Arc::new(model));
        assert_eq!(
            agent.generate_statement("Rule.").await.unwrap_err(),
            AgentError::EmptyResponse
        );
        assert!(agent.memories().is_empty());
    }

    #[test]
    fn test_sanitize_keeps_foreign_tags() {
        let model = MockModel::new();
        let agent = PersonaAgent::for_participant(&judge(), Arc::new(model));
        assert_eq!(agent.sanitize("Objection: that is hearsay"), "Objection: that is hearsay");
        assert_eq!(agent.sanitize("**Judge Reyes**: Sustained."), "Sustained.");
    }

    #[tokio::test]
    async fn test_prompt_holds_only_recent_memories() {
        let mut model = MockModel::new();
        model.expect_name().return_const("mock".to_string());
        model
            .expect_generate()
            .withf(|prompt, _| !prompt.contains("Heard: 0") && prompt.contains("Heard: 6"))
            .returning(|_, _| Ok("Noted.".to_string()));

        let agent = PersonaAgent::for_participant(&judge(), Arc::new(model));
        for i in 0..7 {
            agent.think(&i.to_string()).await;
        }
        assert_eq!(agent.generate_statement("Continue.").await.unwrap(), "Noted.");
    }
}
