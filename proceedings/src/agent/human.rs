//! Interactive participant driven by a person at the console.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use super::{Agent, AgentError, AgentResult};

/// Sending half of a human participant's input queue.
#[derive(Debug, Clone)]
pub struct HumanInput {
    sender: mpsc::Sender<String>,
}

impl HumanInput {
    /// Queue the participant's next statement.
    pub async fn send(&self, text: impl Into<String>) -> AgentResult<()> {
        self.sender
            .send(text.into())
            .await
            .map_err(|_| AgentError::Unavailable("courtroom no longer accepts input".into()))
    }
}

/// An agent whose statements come from a person.
pub struct HumanAgent {
    name: String,
    inbox: AsyncMutex<mpsc::Receiver<String>>,
    last_prompt: Mutex<Option<String>>,
}

impl HumanAgent {
    /// Create the agent and the sender a front end types into.
    pub fn channel(name: impl Into<String>, capacity: usize) -> (Self, HumanInput) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let agent = Self {
            name: name.into(),
            inbox: AsyncMutex::new(receiver),
            last_prompt: Mutex::new(None),
        };
        (agent, HumanInput { sender })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prompt the person is currently answering.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl Agent for HumanAgent {
    async fn think(&self, _context: &str) {}

    async fn generate_statement(&self, prompt: &str) -> AgentResult<String> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        let mut inbox = self.inbox.lock().await;
        match inbox.recv().await {
            Some(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    Err(AgentError::EmptyResponse)
                } else {
                    Ok(text)
                }
            }
            None => Err(AgentError::Unavailable(format!(
                "input for {} was closed",
                self.name
            ))),
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}
