//! Prompt context handed to agents.

use crate::case::{Case, Participant, Role};
use crate::engine::{ActionType, DetailLevel, TrialPhase};
use crate::transcript::TranscriptEntry;

/// Everything an agent is told before it acts.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub phase: TrialPhase,
    pub case: &'a Case,
    pub speaker: &'a Participant,
    /// Who the utterance is directed at, if anyone.
    pub target_role: Option<Role>,
    pub action: ActionType,
    pub instruction: &'a str,
    pub recent: &'a [TranscriptEntry],
}

impl<'a> PromptContext<'a> {
    /// Context for `speaker` with the transcript window sized by `detail`.
    pub fn new(
        case: &'a Case,
        speaker: &'a Participant,
        phase: TrialPhase,
        action: ActionType,
        instruction: &'a str,
        detail: DetailLevel,
    ) -> Self {
        Self {
            phase,
            case,
            speaker,
            target_role: None,
            action,
            instruction,
            recent: case.record().recent(detail.context_window()),
        }
    }

    /// Replace the transcript window, for runs that keep no transcript.
    pub fn with_recent(mut self, recent: &'a [TranscriptEntry]) -> Self {
        self.recent = recent;
        self
    }

    pub fn targeting(mut self, role: Option<Role>) -> Self {
        self.target_role = role;
        self
    }

    /// Evidence summaries, one line each.
    pub fn evidence_summaries(&self) -> Vec<String> {
        self.case.evidence.iter().map(|e| e.summary()).collect()
    }

    /// Full prompt text.
    pub fn render(&self) -> String {
        let case = self.case;
        let mut out = String::new();

        out.push_str(&format!(
            "You are {}, acting as {} in the {} case \"{}\" ({} procedure).\n",
            self.speaker.name,
            self.speaker.role.title(),
            case.case_type,
            case.title,
            case.legal_system
        ));
        if !self.speaker.background.is_empty() {
            out.push_str(&format!("Background: {}\n", self.speaker.background));
        }
        out.push_str(&format!(
            "Personality: {}\n",
            self.speaker.personality.describe()
        ));
        if !self.speaker.objectives.is_empty() {
            out.push_str(&format!("Objectives: {}\n", self.speaker.objectives.join("; ")));
        }

        out.push_str(&format!("\nCurrent phase: {}\n", self.phase.title()));
        if !case.summary.is_empty() {
            out.push_str(&format!("Case background: {}\n", case.summary));
        }
        for fact in &case.facts {
            out.push_str(&format!("- {}\n", fact));
        }

        let evidence = self.evidence_summaries();
        if !evidence.is_empty() {
            out.push_str("\nEvidence:\n");
            for line in evidence {
                out.push_str(&format!("- {}\n", line));
            }
        }

        if !self.recent.is_empty() {
            out.push_str("\nRecent proceedings:\n");
            for entry in self.recent {
                out.push_str(&entry.render());
                out.push('\n');
            }
        }

        out.push_str(&format!("\nAction: {}", self.action));
        if let Some(target) = self.target_role {
            out.push_str(&format!(" (addressing the {})", target.title()));
        }
        out.push_str(&format!("\nInstruction: {}\n", self.instruction));
        out
    }
}
