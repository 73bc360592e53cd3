//! Trial phases and their fixed ordering.

use serde::{Deserialize, Serialize};

use crate::case::CaseType;

/// Stage of a trial.
///
/// Phases only ever advance; see [`TrialPhase::ordinal`]. The two
/// case-in-chief variants share a position, a run enters one of them
/// depending on the case type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrialPhase {
    #[default]
    PreTrial,
    JurySelection,
    OpeningStatements,
    PlaintiffCase,
    ProsecutionCase,
    DefenseCase,
    Rebuttal,
    ClosingArguments,
    JuryDeliberation,
    Verdict,
    Sentencing,
}

impl TrialPhase {
    /// Every phase, in order.
    pub const ALL: [TrialPhase; 11] = [
        Self::PreTrial,
        Self::JurySelection,
        Self::OpeningStatements,
        Self::PlaintiffCase,
        Self::ProsecutionCase,
        Self::DefenseCase,
        Self::Rebuttal,
        Self::ClosingArguments,
        Self::JuryDeliberation,
        Self::Verdict,
        Self::Sentencing,
    ];

    /// Position in the fixed ordering.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::PreTrial => 0,
            Self::JurySelection => 1,
            Self::OpeningStatements => 2,
            Self::PlaintiffCase | Self::ProsecutionCase => 3,
            Self::DefenseCase => 4,
            Self::Rebuttal => 5,
            Self::ClosingArguments => 6,
            Self::JuryDeliberation => 7,
            Self::Verdict => 8,
            Self::Sentencing => 9,
        }
    }

    /// Whether the run may end after this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Verdict | Self::Sentencing)
    }

    /// The case-in-chief phase for `case_type`.
    pub fn case_in_chief(case_type: CaseType) -> Self {
        if case_type.is_criminal() {
            Self::ProsecutionCase
        } else {
            Self::PlaintiffCase
        }
    }

    /// Phase sequence for `case_type`, conditional phases included.
    pub fn sequence(case_type: CaseType) -> [TrialPhase; 10] {
        [
            Self::PreTrial,
            Self::JurySelection,
            Self::OpeningStatements,
            Self::case_in_chief(case_type),
            Self::DefenseCase,
            Self::Rebuttal,
            Self::ClosingArguments,
            Self::JuryDeliberation,
            Self::Verdict,
            Self::Sentencing,
        ]
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::PreTrial => "Pre-Trial",
            Self::JurySelection => "Jury Selection",
            Self::OpeningStatements => "Opening Statements",
            Self::PlaintiffCase => "Plaintiff's Case",
            Self::ProsecutionCase => "Prosecution's Case",
            Self::DefenseCase => "Defense Case",
            Self::Rebuttal => "Rebuttal",
            Self::ClosingArguments => "Closing Arguments",
            Self::JuryDeliberation => "Jury Deliberation",
            Self::Verdict => "Verdict",
            Self::Sentencing => "Sentencing",
        }
    }
}

impl std::fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PreTrial => "pre-trial",
            Self::JurySelection => "jury-selection",
            Self::OpeningStatements => "opening-statements",
            Self::PlaintiffCase => "plaintiff-case",
            Self::ProsecutionCase => "prosecution-case",
            Self::DefenseCase => "defense-case",
            Self::Rebuttal => "rebuttal",
            Self::ClosingArguments => "closing-arguments",
            Self::JuryDeliberation => "jury-deliberation",
            Self::Verdict => "verdict",
            Self::Sentencing => "sentencing",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_non_decreasing() {
        let ordinals: Vec<u8> = TrialPhase::ALL.iter().map(|p| p.ordinal()).collect();
        assert!(ordinals.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            TrialPhase::PlaintiffCase.ordinal(),
            TrialPhase::ProsecutionCase.ordinal()
        );
    }

    #[test]
    fn test_sequence_is_strictly_increasing() {
        for case_type in [CaseType::Criminal, CaseType::Civil] {
            let seq = TrialPhase::sequence(case_type);
            assert!(seq.windows(2).all(|w| w[0].ordinal() < w[1].ordinal()));
        }
        assert!(TrialPhase::sequence(CaseType::Criminal).contains(&TrialPhase::ProsecutionCase));
        assert!(TrialPhase::sequence(CaseType::Corporate).contains(&TrialPhase::PlaintiffCase));
    }

    #[test]
    fn test_display_matches_serde() {
        for phase in TrialPhase::ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase));
        }
    }

    #[test]
    fn test_terminal_phases() {
        assert!(TrialPhase::Verdict.is_terminal());
        assert!(TrialPhase::Sentencing.is_terminal());
        assert!(!TrialPhase::Rebuttal.is_terminal());
        assert_eq!(TrialPhase::default(), TrialPhase::PreTrial);
    }
}
