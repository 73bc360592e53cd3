//! Verdict calculation: bench scoring and per-juror ballots.
//!
//! Two paths produce a verdict:
//!
//! - **Bench**: `score = evidence − sustained objections + jitter`, compared
//!   against a threshold. The jitter comes from the injected
//!   [`RandomSource`], so a seeded run always yields the same verdict.
//! - **Jury**: each juror votes `(evidence strength + personal bias) > 0.5`
//!   and the outcome needs a jurisdiction-defined [`MajorityRule`].

use serde::{Deserialize, Serialize};

use crate::case::{CaseType, Participant, ParticipantId, Personality, TRAIT_MAX};
use crate::random::RandomSource;

/// Outcome of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Guilty,
    NotGuilty,
    Liable,
    NotLiable,
}

impl Verdict {
    /// Verdict for a case type, `adverse` meaning against the defendant.
    pub fn for_case(case_type: CaseType, adverse: bool) -> Self {
        match (case_type.is_criminal(), adverse) {
            (true, true) => Self::Guilty,
            (true, false) => Self::NotGuilty,
            (false, true) => Self::Liable,
            (false, false) => Self::NotLiable,
        }
    }

    /// Whether the defendant lost (sentencing follows).
    pub fn is_adverse(self) -> bool {
        matches!(self, Self::Guilty | Self::Liable)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guilty => write!(f, "GUILTY"),
            Self::NotGuilty => write!(f, "NOT GUILTY"),
            Self::Liable => write!(f, "LIABLE"),
            Self::NotLiable => write!(f, "NOT LIABLE"),
        }
    }
}

/// How many juror votes a verdict requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MajorityRule {
    /// Every juror.
    Unanimous,
    /// At least `votes` jurors (capped at the jury size).
    AtLeast { votes: usize },
    /// At least `numerator / denominator` of the jury, rounded up.
    Fraction { numerator: u32, denominator: u32 },
}

impl MajorityRule {
    /// Votes required for a jury of `jury_size`.
    pub fn required(self, jury_size: usize) -> usize {
        if jury_size == 0 {
            return 0;
        }
        match self {
            Self::Unanimous => jury_size,
            Self::AtLeast { votes } => votes.clamp(1, jury_size),
            Self::Fraction {
                numerator,
                denominator,
            } => {
                let den = denominator.max(1) as usize;
                let num = (numerator as usize).min(den);
                ((jury_size * num).div_ceil(den)).clamp(1, jury_size)
            }
        }
    }
}

impl std::fmt::Display for MajorityRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unanimous => write!(f, "unanimous"),
            Self::AtLeast { votes } => write!(f, "at least {votes}"),
            Self::Fraction {
                numerator,
                denominator,
            } => write!(f, "{numerator}/{denominator}"),
        }
    }
}

/// Accumulated trial facts the verdict is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreInputs {
    /// Admitted evidence introduced by the prosecution/plaintiff.
    pub evidence_count: usize,
    /// Objections the judge sustained.
    pub sustained_objections: usize,
    /// Evidence items in the case file.
    pub total_evidence: usize,
}

impl ScoreInputs {
    /// Normalised strength of the case against the defendant, in `[0, 1]`.
    pub fn evidence_strength(&self) -> f64 {
        if self.total_evidence == 0 {
            return 0.0;
        }
        let raw = self.evidence_count as f64 - 0.5 * self.sustained_objections as f64;
        (raw / self.total_evidence as f64).clamp(0.0, 1.0)
    }
}

/// Bench scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictCalculator {
    /// Scores strictly above this are adverse to the defendant.
    pub threshold: f64,
    /// Jitter bound; draws are uniform in `[-jitter, jitter]`.
    pub jitter: f64,
}

impl Default for VerdictCalculator {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            jitter: 1.0,
        }
    }
}

impl VerdictCalculator {
    pub fn score(&self, inputs: ScoreInputs, rng: &mut dyn RandomSource) -> f64 {
        inputs.evidence_count as f64 - inputs.sustained_objections as f64 + rng.jitter(self.jitter)
    }

    pub fn decide(
        &self,
        case_type: CaseType,
        inputs: ScoreInputs,
        rng: &mut dyn RandomSource,
    ) -> Verdict {
        self.assess(case_type, inputs, rng).verdict
    }

    /// Score and verdict together.
    pub fn assess(
        &self,
        case_type: CaseType,
        inputs: ScoreInputs,
        rng: &mut dyn RandomSource,
    ) -> BenchAssessment {
        let score = self.score(inputs, rng);
        BenchAssessment {
            score,
            threshold: self.threshold,
            verdict: Verdict::for_case(case_type, score > self.threshold),
        }
    }
}

/// A bench verdict with the score that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchAssessment {
    pub score: f64,
    pub threshold: f64,
    pub verdict: Verdict,
}

impl BenchAssessment {
    pub fn summary_line(&self) -> String {
        format!(
            "{} (score {:.2} against threshold {:.2})",
            self.verdict, self.score, self.threshold
        )
    }
}

/// The verdict a run settled on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictFinding {
    pub verdict: Verdict,
    pub hung: bool,
    pub reasoning: String,
}

impl From<&JuryTally> for VerdictFinding {
    fn from(tally: &JuryTally) -> Self {
        Self {
            verdict: tally.verdict,
            hung: tally.hung,
            reasoning: format!("jury {}", tally.summary_line()),
        }
    }
}

impl From<BenchAssessment> for VerdictFinding {
    fn from(bench: BenchAssessment) -> Self {
        Self {
            verdict: bench.verdict,
            hung: false,
            reasoning: format!("bench {}", bench.summary_line()),
        }
    }
}

/// Bias in `[-0.5, 0.5]` from assertiveness against empathy.
pub fn personal_bias(personality: &Personality) -> f64 {
    let p = personality.clamped();
    (p.assertiveness - p.empathy) / (2.0 * TRAIT_MAX)
}

/// One juror's vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurorBallot {
    pub juror_id: ParticipantId,
    /// `true` votes against the defendant.
    pub adverse: bool,
    pub bias: f64,
}

impl JurorBallot {
    pub fn cast(juror: &Participant, evidence_strength: f64) -> Self {
        let bias = personal_bias(&juror.personality);
        Self {
            juror_id: juror.id.clone(),
            adverse: evidence_strength + bias > 0.5,
            bias,
        }
    }
}

/// Counted jury ballots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JuryTally {
    pub ballots: Vec<JurorBallot>,
    pub required: usize,
    pub adverse_votes: usize,
    pub favourable_votes: usize,
    pub verdict: Verdict,
    /// Neither side reached the required majority.
    pub hung: bool,
}

impl JuryTally {
    /// Count ballots under `rule`; without the required adverse majority the
    /// defendant prevails.
    pub fn count(ballots: Vec<JurorBallot>, rule: MajorityRule, case_type: CaseType) -> Self {
        let required = rule.required(ballots.len());
        let adverse_votes = ballots.iter().filter(|b| b.adverse).count();
        let favourable_votes = ballots.len() - adverse_votes;
        let adverse = !ballots.is_empty() && adverse_votes >= required;
        let hung = !adverse && favourable_votes < required;
        Self {
            ballots,
            required,
            adverse_votes,
            favourable_votes,
            verdict: Verdict::for_case(case_type, adverse),
            hung,
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} ({}-{}, {} required{})",
            self.verdict,
            self.adverse_votes,
            self.favourable_votes,
            self.required,
            if self.hung { ", hung" } else { "" }
        )
    }
}
