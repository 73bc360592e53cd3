//! Actions participants take during a trial.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TrialPhase;
use crate::case::{ParticipantId, Role};
use crate::transcript::{EntryKind, TranscriptEntry};

/// What a participant is doing when they speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    Announcement,
    Motion,
    Ruling,
    VoirDire,
    JurorResponse,
    OpeningStatement,
    CallWitness,
    DirectExamination,
    CrossExamination,
    WitnessAnswer,
    Objection,
    IntroduceEvidence,
    Rebuttal,
    ClosingArgument,
    JuryInstruction,
    Deliberation,
    VerdictReading,
    JuryPoll,
    Sentencing,
    Sidebar,
}

impl ActionType {
    /// Transcript entry kind the action is recorded as.
    pub fn entry_kind(self) -> EntryKind {
        match self {
            Self::VoirDire | Self::DirectExamination | Self::CrossExamination => EntryKind::Question,
            Self::Objection => EntryKind::Objection,
            Self::Ruling => EntryKind::Ruling,
            Self::IntroduceEvidence => EntryKind::Exhibit,
            Self::Sidebar => EntryKind::Sidebar,
            _ => EntryKind::Statement,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Announcement => "announcement",
            Self::Motion => "motion",
            Self::Ruling => "ruling",
            Self::VoirDire => "voir-dire",
            Self::JurorResponse => "juror-response",
            Self::OpeningStatement => "opening-statement",
            Self::CallWitness => "call-witness",
            Self::DirectExamination => "direct-examination",
            Self::CrossExamination => "cross-examination",
            Self::WitnessAnswer => "witness-answer",
            Self::Objection => "objection",
            Self::IntroduceEvidence => "introduce-evidence",
            Self::Rebuttal => "rebuttal",
            Self::ClosingArgument => "closing-argument",
            Self::JuryInstruction => "jury-instruction",
            Self::Deliberation => "deliberation",
            Self::VerdictReading => "verdict-reading",
            Self::JuryPoll => "jury-poll",
            Self::Sentencing => "sentencing",
            Self::Sidebar => "sidebar",
        };
        write!(f, "{s}")
    }
}

/// One thing a participant said or did, as reported to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtAction {
    pub id: String,
    pub phase: TrialPhase,
    pub participant_id: ParticipantId,
    pub speaker_name: String,
    pub role: Role,
    pub action_type: ActionType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Transcript entry recording this action, when transcripts are kept.
    pub entry_id: Option<String>,
}

impl CourtAction {
    pub fn new(
        phase: TrialPhase,
        participant_id: impl Into<String>,
        speaker_name: impl Into<String>,
        role: Role,
        action_type: ActionType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phase,
            participant_id: participant_id.into(),
            speaker_name: speaker_name.into(),
            role,
            action_type,
            content: content.into(),
            timestamp: Utc::now(),
            entry_id: None,
        }
    }

    /// Transcript form of this action, tagged with its action and phase.
    pub fn to_entry(&self) -> TranscriptEntry {
        TranscriptEntry::new(
            self.participant_id.clone(),
            self.role,
            self.action_type.entry_kind(),
            self.content.clone(),
        )
        .with_metadata(serde_json::json!({
            "action": self.action_type.to_string(),
            "phase": self.phase.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kinds() {
        assert_eq!(ActionType::CrossExamination.entry_kind(), EntryKind::Question);
        assert_eq!(ActionType::IntroduceEvidence.entry_kind(), EntryKind::Exhibit);
        assert_eq!(ActionType::Objection.entry_kind(), EntryKind::Objection);
        assert_eq!(ActionType::Ruling.entry_kind(), EntryKind::Ruling);
        assert_eq!(ActionType::ClosingArgument.entry_kind(), EntryKind::Statement);
    }

    #[test]
    fn test_to_entry_carries_action_and_phase() {
        let action = CourtAction::new(
            TrialPhase::OpeningStatements,
            "da",
            "Ms. Park",
            Role::Prosecutor,
            ActionType::OpeningStatement,
            "The evidence will show.",
        );
        let entry = action.to_entry();
        assert_eq!(entry.speaker_id, "da");
        assert_eq!(entry.kind, EntryKind::Statement);
        assert_eq!(entry.content, "The evidence will show.");
        assert_eq!(entry.metadata.unwrap()["action"], "opening-statement");
    }

    #[test]
    fn test_action_type_serde_matches_display() {
        for action in [
            ActionType::VoirDire,
            ActionType::CallWitness,
            ActionType::VerdictReading,
            ActionType::JuryPoll,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action));
        }
    }

    #[test]
    fn test_new_action_has_no_entry() {
        let action = CourtAction::new(
            TrialPhase::Verdict,
            "j1",
            "Judge Reyes",
            Role::Judge,
            ActionType::VerdictReading,
            "Not guilty.",
        );
        assert!(action.entry_id.is_none());
        assert!(!action.id.is_empty());
    }
}
