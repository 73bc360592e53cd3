//! Append-only record of statements, objections and rulings.
//!
//! Insertion order is the only meaningful order. Nothing is ever removed or
//! reordered; readers get slices or clones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::case::{ParticipantId, Role};

/// What a transcript entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Statement,
    Question,
    Objection,
    Ruling,
    Exhibit,
    Sidebar,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Statement => write!(f, "statement"),
            Self::Question => write!(f, "question"),
            Self::Objection => write!(f, "objection"),
            Self::Ruling => write!(f, "ruling"),
            Self::Exhibit => write!(f, "exhibit"),
            Self::Sidebar => write!(f, "sidebar"),
        }
    }
}

/// One immutable recorded utterance or procedural event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub speaker_id: ParticipantId,
    pub role: Role,
    pub content: String,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TranscriptEntry {
    pub fn new(
        speaker_id: impl Into<String>,
        role: Role,
        kind: EntryKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            speaker_id: speaker_id.into(),
            role,
            content: content.into(),
            kind,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// One-line rendering used in prompt context.
    pub fn render(&self) -> String {
        format!("[{}] {}: {}", self.kind, self.role.title(), self.content)
    }
}

/// Category of a judge's ruling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulingKind {
    Objection,
    Motion,
    Admissibility,
    Procedural,
}

impl std::fmt::Display for RulingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Objection => write!(f, "objection"),
            Self::Motion => write!(f, "motion"),
            Self::Admissibility => write!(f, "admissibility"),
            Self::Procedural => write!(f, "procedural"),
        }
    }
}

/// Outcome of a ruling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Sustained,
    Overruled,
    Granted,
    Denied,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sustained => write!(f, "Sustained"),
            Self::Overruled => write!(f, "Overruled"),
            Self::Granted => write!(f, "Granted"),
            Self::Denied => write!(f, "Denied"),
        }
    }
}

/// A judge's formal decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruling {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Issuing judge; `None` only for a verdict reached without a presiding judge.
    pub judge_id: Option<ParticipantId>,
    pub kind: RulingKind,
    pub subject: String,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Transcript entry that triggered this ruling, when one was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
}

impl Ruling {
    pub fn new(
        judge_id: Option<ParticipantId>,
        kind: RulingKind,
        subject: impl Into<String>,
        decision: Decision,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            judge_id,
            kind,
            subject: subject.into(),
            decision,
            reasoning: None,
            entry_id: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn for_entry(mut self, entry_id: Option<String>) -> Self {
        self.entry_id = entry_id;
        self
    }
}

/// Subject of the single ruling that records the verdict.
pub const VERDICT_SUBJECT: &str = "verdict";

/// Subject for any ruling other than the verdict. A subject that reads as
/// [`VERDICT_SUBJECT`] is prefixed with its kind so it never collides.
pub fn ruling_subject(kind: RulingKind, subject: &str) -> String {
    if subject.trim().eq_ignore_ascii_case(VERDICT_SUBJECT) {
        format!("{kind} {}", subject.trim())
    } else {
        subject.to_string()
    }
}

/// Append-only record of a trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    entries: Vec<TranscriptEntry>,
    #[serde(default)]
    rulings: Vec<Ruling>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning its id.
    pub fn append_entry(&mut self, entry: TranscriptEntry) -> String {
        let id = entry.id.clone();
        self.entries.push(entry);
        id
    }

    pub fn append_ruling(&mut self, ruling: Ruling) {
        self.rulings.push(ruling);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn rulings(&self) -> &[Ruling] {
        &self.rulings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last `n` entries in recorded order.
    pub fn recent(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Objection rulings decided `Sustained`.
    pub fn sustained_objections(&self) -> usize {
        self.rulings
            .iter()
            .filter(|r| r.kind == RulingKind::Objection && r.decision == Decision::Sustained)
            .count()
    }

    pub fn verdict_rulings(&self) -> impl Iterator<Item = &Ruling> {
        self.rulings.iter().filter(|r| r.subject == VERDICT_SUBJECT)
    }
}
