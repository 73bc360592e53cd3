//! Case model: the matter under trial, its evidence and its participants.
//!
//! A case is produced by an external case-generation step and handed to the
//! engine whole. From then on only the engine appends to its transcript and
//! rulings or advances its phase; everyone else reads copies.

pub mod loader;
pub mod participant;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::TrialPhase;
use crate::transcript::{Ruling, Transcript, TranscriptEntry};

pub use loader::{load_case, CaseError, CaseResult};
pub use participant::{Participant, ParticipantId, Personality, Role, Side, TRAIT_MAX};

/// Category of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseType {
    #[default]
    Criminal,
    Civil,
    Family,
    Corporate,
    Constitutional,
}

impl CaseType {
    /// Criminal matters end in guilt; everything else in liability.
    pub fn is_criminal(self) -> bool {
        self == Self::Criminal
    }
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Criminal => write!(f, "criminal"),
            Self::Civil => write!(f, "civil"),
            Self::Family => write!(f, "family"),
            Self::Corporate => write!(f, "corporate"),
            Self::Constitutional => write!(f, "constitutional"),
        }
    }
}

/// Legal system whose procedure governs the trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegalSystem {
    #[default]
    CommonLaw,
    Louisiana,
}

impl std::fmt::Display for LegalSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommonLaw => write!(f, "common-law"),
            Self::Louisiana => write!(f, "louisiana"),
        }
    }
}

impl std::str::FromStr for LegalSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "common-law" | "common_law" | "commonlaw" => Ok(Self::CommonLaw),
            "louisiana" => Ok(Self::Louisiana),
            other => Err(format!("unknown legal system: {other}")),
        }
    }
}

fn default_true() -> bool {
    true
}

/// An item of evidence in the case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Party that introduces this item.
    #[serde(default)]
    pub offered_by: Side,
    #[serde(default = "default_true")]
    pub admissible: bool,
}

impl Evidence {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            offered_by: Side::Prosecution,
            admissible: true,
        }
    }

    pub fn offered_by(mut self, side: Side) -> Self {
        self.offered_by = side;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn inadmissible(mut self) -> Self {
        self.admissible = false;
        self
    }

    pub fn summary(&self) -> String {
        if self.description.is_empty() {
            format!("{} ({})", self.title, self.id)
        } else {
            format!("{} ({}): {}", self.title, self.id, self.description)
        }
    }
}

/// The matter under trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub case_number: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub case_type: CaseType,
    #[serde(default)]
    pub legal_system: LegalSystem,
    /// Background summary read to every agent.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub participants: Vec<Arc<Participant>>,
    #[serde(default)]
    current_phase: TrialPhase,
    #[serde(default)]
    record: Transcript,
}

impl Case {
    pub fn new(title: impl Into<String>, case_type: CaseType) -> Self {
        Self {
            case_number: String::new(),
            title: title.into(),
            case_type,
            legal_system: LegalSystem::default(),
            summary: String::new(),
            facts: Vec::new(),
            evidence: Vec::new(),
            participants: Vec::new(),
            current_phase: TrialPhase::default(),
            record: Transcript::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_legal_system(mut self, system: LegalSystem) -> Self {
        self.legal_system = system;
        self
    }

    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.push(Arc::new(participant));
        self
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    pub fn current_phase(&self) -> TrialPhase {
        self.current_phase
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.record.entries()
    }

    pub fn rulings(&self) -> &[Ruling] {
        self.record.rulings()
    }

    pub fn record(&self) -> &Transcript {
        &self.record
    }

    pub(crate) fn record_mut(&mut self) -> &mut Transcript {
        &mut self.record
    }

    pub(crate) fn set_phase(&mut self, phase: TrialPhase) {
        self.current_phase = phase;
    }

    /// First participant holding `role`, in declaration order.
    pub fn participant_with_role(&self, role: Role) -> Option<&Arc<Participant>> {
        self.participants.iter().find(|p| p.role == role)
    }

    pub fn participants_with_role(&self, role: Role) -> impl Iterator<Item = &Arc<Participant>> {
        self.participants.iter().filter(move |p| p.role == role)
    }

    pub fn participant(&self, id: &str) -> Option<&Arc<Participant>> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn evidence_by(&self, side: Side) -> impl Iterator<Item = &Evidence> {
        self.evidence.iter().filter(move |e| e.offered_by == side)
    }

    /// Structural checks only; a missing role never invalidates a case.
    pub fn validate(&self) -> CaseResult<()> {
        if self.title.trim().is_empty() {
            return Err(CaseError::Invalid("case title is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for p in &self.participants {
            if !seen.insert(p.id.as_str()) {
                return Err(CaseError::Invalid(format!(
                    "duplicate participant id: {}",
                    p.id
                )));
            }
        }
        Ok(())
    }
}
