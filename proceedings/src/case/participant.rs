//! Courtroom participants: roles, personality vectors and sides.

use serde::{Deserialize, Serialize};

/// Identifier of a participant, unique within a case.
pub type ParticipantId = String;

/// Procedural capacity a participant acts in.
///
/// Immutable once the participant is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Judge,
    Prosecutor,
    PlaintiffAttorney,
    DefenseAttorney,
    Plaintiff,
    Defendant,
    Witness,
    JuryMember,
    Bailiff,
    CourtClerk,
    Observer,
}

impl Role {
    /// Whether this role argues on behalf of a party.
    pub fn is_counsel(self) -> bool {
        matches!(
            self,
            Self::Prosecutor | Self::PlaintiffAttorney | Self::DefenseAttorney
        )
    }

    /// The side a party-aligned role stands on, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Self::Prosecutor | Self::PlaintiffAttorney | Self::Plaintiff => Some(Side::Prosecution),
            Self::DefenseAttorney | Self::Defendant => Some(Side::Defense),
            _ => None,
        }
    }

    /// Human-readable title used in prompts.
    pub fn title(self) -> &'static str {
        match self {
            Self::Judge => "Judge",
            Self::Prosecutor => "Prosecutor",
            Self::PlaintiffAttorney => "Plaintiff's Attorney",
            Self::DefenseAttorney => "Defense Attorney",
            Self::Plaintiff => "Plaintiff",
            Self::Defendant => "Defendant",
            Self::Witness => "Witness",
            Self::JuryMember => "Juror",
            Self::Bailiff => "Bailiff",
            Self::CourtClerk => "Court Clerk",
            Self::Observer => "Observer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Judge => write!(f, "judge"),
            Self::Prosecutor => write!(f, "prosecutor"),
            Self::PlaintiffAttorney => write!(f, "plaintiff-attorney"),
            Self::DefenseAttorney => write!(f, "defense-attorney"),
            Self::Plaintiff => write!(f, "plaintiff"),
            Self::Defendant => write!(f, "defendant"),
            Self::Witness => write!(f, "witness"),
            Self::JuryMember => write!(f, "jury-member"),
            Self::Bailiff => write!(f, "bailiff"),
            Self::CourtClerk => write!(f, "court-clerk"),
            Self::Observer => write!(f, "observer"),
        }
    }
}

/// The two parties of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    /// Prosecution in criminal matters, plaintiff otherwise.
    #[default]
    Prosecution,
    Defense,
}

impl Side {
    pub fn opposing(self) -> Side {
        match self {
            Self::Prosecution => Self::Defense,
            Self::Defense => Self::Prosecution,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prosecution => write!(f, "prosecution"),
            Self::Defense => write!(f, "defense"),
        }
    }
}

/// Upper bound of every personality trait.
pub const TRAIT_MAX: f64 = 10.0;

fn neutral_trait() -> f64 {
    TRAIT_MAX / 2.0
}

/// Seven-trait personality vector, each trait in `0.0..=10.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    #[serde(default = "neutral_trait")]
    pub openness: f64,
    #[serde(default = "neutral_trait")]
    pub conscientiousness: f64,
    #[serde(default = "neutral_trait")]
    pub extraversion: f64,
    #[serde(default = "neutral_trait")]
    pub agreeableness: f64,
    #[serde(default = "neutral_trait")]
    pub neuroticism: f64,
    #[serde(default = "neutral_trait")]
    pub assertiveness: f64,
    #[serde(default = "neutral_trait")]
    pub empathy: f64,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            openness: neutral_trait(),
            conscientiousness: neutral_trait(),
            extraversion: neutral_trait(),
            agreeableness: neutral_trait(),
            neuroticism: neutral_trait(),
            assertiveness: neutral_trait(),
            empathy: neutral_trait(),
        }
    }
}

impl Personality {
    /// Copy with every trait clamped into the bounded range.
    pub fn clamped(&self) -> Self {
        let c = |v: f64| if v.is_finite() { v.clamp(0.0, TRAIT_MAX) } else { neutral_trait() };
        Self {
            openness: c(self.openness),
            conscientiousness: c(self.conscientiousness),
            extraversion: c(self.extraversion),
            agreeableness: c(self.agreeableness),
            neuroticism: c(self.neuroticism),
            assertiveness: c(self.assertiveness),
            empathy: c(self.empathy),
        }
    }

    /// Short prose rendering for prompts.
    pub fn describe(&self) -> String {
        format!(
            "openness {:.0}, conscientiousness {:.0}, extraversion {:.0}, agreeableness {:.0}, \
             neuroticism {:.0}, assertiveness {:.0}, empathy {:.0} (out of 10)",
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism,
            self.assertiveness,
            self.empathy
        )
    }
}

/// A person in the courtroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
    /// Whether an AI agent drives this participant.
    #[serde(default = "default_ai_controlled")]
    pub ai_controlled: bool,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub background: String,
    /// Current mood, an extension point the engine does not mutate yet.
    #[serde(default)]
    pub mood: f64,
    #[serde(default)]
    pub knowledge: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Party that calls this participant as a witness.
    #[serde(default)]
    pub side: Option<Side>,
}

fn default_ai_controlled() -> bool {
    true
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            ai_controlled: true,
            personality: Personality::default(),
            background: String::new(),
            mood: 0.0,
            knowledge: Vec::new(),
            objectives: Vec::new(),
            side: None,
        }
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality.clamped();
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn human_controlled(mut self) -> Self {
        self.ai_controlled = false;
        self
    }

    /// Side whose witness list this participant belongs to.
    pub fn called_by(&self) -> Side {
        self.side.unwrap_or_default()
    }
}
