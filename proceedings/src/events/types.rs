//! Lifecycle events emitted by the trial engine
//!
//! These are consumed by an external presentation layer; the engine never
//! waits on a consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::{ParticipantId, Role};
use crate::engine::{CourtAction, TrialPhase};
use crate::verdict::Verdict;

/// All events a trial run can produce
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrialEvent {
    /// The run began; emitted before any phase work
    SimulationStarted {
        case_title: String,
        timestamp: DateTime<Utc>,
    },

    /// A phase is about to be entered
    PhaseChanged {
        phase: TrialPhase,
        timestamp: DateTime<Utc>,
    },

    /// A participant produced an action
    ActionGenerated {
        action: CourtAction,
        timestamp: DateTime<Utc>,
    },

    /// Jurors retired to deliberate
    JuryDeliberationStarted {
        jurors: usize,
        timestamp: DateTime<Utc>,
    },

    SimulationPaused {
        phase: TrialPhase,
        timestamp: DateTime<Utc>,
    },

    SimulationResumed {
        phase: TrialPhase,
        timestamp: DateTime<Utc>,
    },

    SimulationStopped {
        phase: TrialPhase,
        timestamp: DateTime<Utc>,
    },

    /// The run finished with a verdict
    SimulationCompleted {
        verdict: Verdict,
        timestamp: DateTime<Utc>,
    },

    /// An agent call started (`in_flight = true`) or finished
    AgentProcessing {
        participant_id: ParticipantId,
        participant_name: String,
        reason: String,
        in_flight: bool,
        timestamp: DateTime<Utc>,
    },

    /// An interactive participant is waiting for human input
    UserInputRequested {
        participant_id: ParticipantId,
        role: Role,
        /// What the participant is asked to do.
        instruction: String,
        timestamp: DateTime<Utc>,
    },

    SidebarStarted {
        phase: TrialPhase,
        timestamp: DateTime<Utc>,
    },

    SidebarEnded {
        phase: TrialPhase,
        timestamp: DateTime<Utc>,
    },
}

impl TrialEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TrialEvent::SimulationStarted { timestamp, .. } => *timestamp,
            TrialEvent::PhaseChanged { timestamp, .. } => *timestamp,
            TrialEvent::ActionGenerated { timestamp, .. } => *timestamp,
            TrialEvent::JuryDeliberationStarted { timestamp, .. } => *timestamp,
            TrialEvent::SimulationPaused { timestamp, .. } => *timestamp,
            TrialEvent::SimulationResumed { timestamp, .. } => *timestamp,
            TrialEvent::SimulationStopped { timestamp, .. } => *timestamp,
            TrialEvent::SimulationCompleted { timestamp, .. } => *timestamp,
            TrialEvent::AgentProcessing { timestamp, .. } => *timestamp,
            TrialEvent::UserInputRequested { timestamp, .. } => *timestamp,
            TrialEvent::SidebarStarted { timestamp, .. } => *timestamp,
            TrialEvent::SidebarEnded { timestamp, .. } => *timestamp,
        }
    }

    /// Wire name of the event, as the presentation layer knows it
    pub fn event_type(&self) -> &'static str {
        match self {
            TrialEvent::SimulationStarted { .. } => "simulation:started",
            TrialEvent::PhaseChanged { .. } => "phase:changed",
            TrialEvent::ActionGenerated { .. } => "action:generated",
            TrialEvent::JuryDeliberationStarted { .. } => "jury:deliberation:started",
            TrialEvent::SimulationPaused { .. } => "simulation:paused",
            TrialEvent::SimulationResumed { .. } => "simulation:resumed",
            TrialEvent::SimulationStopped { .. } => "simulation:stopped",
            TrialEvent::SimulationCompleted { .. } => "simulation:completed",
            TrialEvent::AgentProcessing { .. } => "ai:processing",
            TrialEvent::UserInputRequested { .. } => "user:input:requested",
            TrialEvent::SidebarStarted { .. } => "sidebar:started",
            TrialEvent::SidebarEnded { .. } => "sidebar:ended",
        }
    }

    /// Get the phase if this event is phase-scoped
    pub fn phase(&self) -> Option<TrialPhase> {
        match self {
            TrialEvent::PhaseChanged { phase, .. }
            | TrialEvent::SimulationPaused { phase, .. }
            | TrialEvent::SimulationResumed { phase, .. }
            | TrialEvent::SimulationStopped { phase, .. }
            | TrialEvent::SidebarStarted { phase, .. }
            | TrialEvent::SidebarEnded { phase, .. } => Some(*phase),
            TrialEvent::ActionGenerated { action, .. } => Some(action.phase),
            _ => None,
        }
    }

    /// Get the action if this is an `action:generated` event
    pub fn action(&self) -> Option<&CourtAction> {
        match self {
            TrialEvent::ActionGenerated { action, .. } => Some(action),
            _ => None,
        }
    }

    /// Compact one-line rendering for terminals and logs
    pub fn summary_line(&self) -> String {
        match self {
            TrialEvent::SimulationStarted { case_title, .. } => {
                format!("trial started: {}", case_title)
            }
            TrialEvent::PhaseChanged { phase, .. } => format!("── {} ──", phase),
            TrialEvent::ActionGenerated { action, .. } => {
                format!("{} ({}): {}", action.speaker_name, action.role, action.content)
            }
            TrialEvent::JuryDeliberationStarted { jurors, .. } => {
                format!("jury of {} retires to deliberate", jurors)
            }
            TrialEvent::SimulationCompleted { verdict, .. } => format!("verdict: {}", verdict),
            TrialEvent::AgentProcessing {
                participant_name,
                reason,
                in_flight,
                ..
            } => {
                if *in_flight {
                    format!("AI processing: {} {}", participant_name, reason)
                } else {
                    format!("AI done: {} {}", participant_name, reason)
                }
            }
            TrialEvent::UserInputRequested {
                role, instruction, ..
            } => {
                format!("waiting for input as {}: {}", role.title(), instruction)
            }
            other => other.event_type().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let now = Utc::now();
        assert_eq!(
            TrialEvent::SimulationStarted {
                case_title: "x".into(),
                timestamp: now
            }
            .event_type(),
            "simulation:started"
        );
        assert_eq!(
            TrialEvent::PhaseChanged {
                phase: TrialPhase::Verdict,
                timestamp: now
            }
            .event_type(),
            "phase:changed"
        );
        assert_eq!(
            TrialEvent::JuryDeliberationStarted {
                jurors: 6,
                timestamp: now
            }
            .event_type(),
            "jury:deliberation:started"
        );
    }

    #[test]
    fn test_serde_tagging() {
        let event = TrialEvent::SimulationCompleted {
            verdict: Verdict::NotGuilty,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "simulation_completed");
        assert_eq!(json["verdict"], "not_guilty");
    }

    #[test]
    fn test_input_request_names_the_instruction() {
        let event = TrialEvent::UserInputRequested {
            participant_id: "da".into(),
            role: Role::Prosecutor,
            instruction: "Present your opening statement.".into(),
            timestamp: Utc::now(),
        };
        assert_eq!(
            event.summary_line(),
            "waiting for input as Prosecutor: Present your opening statement."
        );
    }

    #[test]
    fn test_phase_scoping() {
        let event = TrialEvent::SidebarStarted {
            phase: TrialPhase::DefenseCase,
            timestamp: Utc::now(),
        };
        assert_eq!(event.phase(), Some(TrialPhase::DefenseCase));
        let started = TrialEvent::SimulationStarted {
            case_title: "x".into(),
            timestamp: Utc::now(),
        };
        assert_eq!(started.phase(), None);
    }
}
