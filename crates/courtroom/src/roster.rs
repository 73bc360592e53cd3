//! Binds each case participant to an agent for a command-line run.

use std::collections::HashMap;
use std::sync::Arc;

use proceedings::{
    AgentRoster, Case, HumanAgent, HumanInput, ModelBackend, Participant, PersonaAgent, Role,
    ScriptedAgent,
};
use tracing::{debug, info};

/// Queue depth for a console participant; one line is consumed per turn.
const HUMAN_INPUT_CAPACITY: usize = 8;

/// Where statements come from.
pub enum AgentSource {
    /// Persona agents sharing one backend (usually the pool).
    Model {
        backend: Arc<dyn ModelBackend>,
        max_tokens: u32,
    },
    /// Canned lines per role, no network.
    Offline,
}

/// Agents for every participant plus the input queues of console participants.
pub struct CliRoster {
    pub roster: AgentRoster,
    pub human_inputs: HashMap<String, HumanInput>,
}

/// Build the roster. Participants with `ai_controlled = false` are read from
/// the console when `human_input` is set and left to fallback text otherwise.
pub fn build_roster(case: &Case, source: &AgentSource, human_input: bool) -> CliRoster {
    let mut roster = AgentRoster::new();
    let mut human_inputs = HashMap::new();

    for participant in &case.participants {
        if !participant.ai_controlled {
            if human_input {
                let (agent, input) = HumanAgent::channel(&participant.name, HUMAN_INPUT_CAPACITY);
                roster.bind(&participant.id, Arc::new(agent));
                human_inputs.insert(participant.id.clone(), input);
                info!(participant = %participant.id, "Console participant");
            }
            continue;
        }

        match source {
            AgentSource::Model {
                backend,
                max_tokens,
            } => {
                let agent = PersonaAgent::for_participant(participant, backend.clone())
                    .with_max_tokens(*max_tokens);
                roster.bind(&participant.id, Arc::new(agent));
            }
            AgentSource::Offline => {
                roster.bind(&participant.id, Arc::new(offline_agent(participant)));
            }
        }
        debug!(participant = %participant.id, role = %participant.role, "Agent bound");
    }

    CliRoster {
        roster,
        human_inputs,
    }
}

fn offline_agent(participant: &Participant) -> ScriptedAgent {
    let lines: &[&str] = match participant.role {
        Role::Judge => &[
            "The court will proceed.",
            "So ordered.",
            "Counsel, you may continue.",
        ],
        Role::Prosecutor | Role::PlaintiffAttorney => &[
            "The evidence will show exactly what happened.",
            "Please tell the court what you saw.",
            "Nothing further.",
        ],
        Role::DefenseAttorney => &[
            "My client is entitled to the presumption the law provides.",
            "Isn't it true you could not see clearly?",
            "No further questions.",
        ],
        Role::Witness | Role::Plaintiff | Role::Defendant => &[
            "Yes, I was there that evening.",
            "I don't recall exactly.",
        ],
        Role::JuryMember => &["I can be fair.", "I have weighed the evidence."],
        Role::CourtClerk | Role::Bailiff => &["Yes, Your Honor."],
        Role::Observer => &["..."],
    };
    ScriptedAgent::new(lines.iter().map(|l| l.to_string()).collect())
}
