//! Per-run simulation settings.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Jury sizes that produce a jury trial.
pub const JURY_SIZE_RANGE: RangeInclusive<usize> = 6..=12;

/// How much of the proceedings is generated and shown to agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailLevel {
    Abbreviated,
    #[default]
    Standard,
    Detailed,
    Full,
}

impl DetailLevel {
    /// Transcript entries included in each prompt.
    pub fn context_window(self) -> usize {
        match self {
            Self::Abbreviated => 3,
            Self::Standard => 5,
            Self::Detailed => 10,
            Self::Full => 20,
        }
    }

    /// Question/answer pairs per examination segment.
    pub fn exchanges_per_segment(self) -> usize {
        match self {
            Self::Abbreviated => 1,
            Self::Standard => 2,
            Self::Detailed => 3,
            Self::Full => 4,
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abbreviated => write!(f, "abbreviated"),
            Self::Standard => write!(f, "standard"),
            Self::Detailed => write!(f, "detailed"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Options a caller picks for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Multiplier on every pacing delay; zero or less disables delays.
    #[serde(alias = "realtimeSpeed")]
    pub realtime_speed: f64,
    /// When false the engine pauses itself after each phase.
    #[serde(alias = "autoProgress")]
    pub auto_progress: bool,
    #[serde(alias = "detailLevel")]
    pub detail_level: DetailLevel,
    #[serde(alias = "enableObjections")]
    pub enable_objections: bool,
    #[serde(alias = "enableSidebar")]
    pub enable_sidebar: bool,
    /// 0 for a bench trial; otherwise 6..=12.
    #[serde(alias = "jurySize")]
    pub jury_size: usize,
    #[serde(alias = "allowUserIntervention")]
    pub allow_user_intervention: bool,
    #[serde(alias = "recordTranscript")]
    pub record_transcript: bool,
    /// Whether parties call their witnesses.
    #[serde(alias = "enableWitnesses")]
    pub enable_witnesses: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            realtime_speed: 1.0,
            auto_progress: true,
            detail_level: DetailLevel::Standard,
            enable_objections: true,
            enable_sidebar: false,
            jury_size: 12,
            allow_user_intervention: false,
            record_transcript: true,
            enable_witnesses: true,
        }
    }
}

impl SimulationSettings {
    /// Bench trial: no jury phases at all.
    pub fn bench() -> Self {
        Self {
            jury_size: 0,
            ..Self::default()
        }
    }

    pub fn has_valid_jury_size(&self) -> bool {
        JURY_SIZE_RANGE.contains(&self.jury_size)
    }

    /// A non-zero size outside the accepted range.
    pub fn has_invalid_jury_size(&self) -> bool {
        self.jury_size != 0 && !self.has_valid_jury_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_scaling() {
        assert_eq!(DetailLevel::Abbreviated.context_window(), 3);
        assert_eq!(DetailLevel::Full.context_window(), 20);
        assert_eq!(DetailLevel::Detailed.exchanges_per_segment(), 3);
    }

    #[test]
    fn test_jury_size_validity() {
        assert!(SimulationSettings::default().has_valid_jury_size());
        assert!(!SimulationSettings::bench().has_valid_jury_size());
        assert!(!SimulationSettings::bench().has_invalid_jury_size());

        let odd = SimulationSettings {
            jury_size: 4,
            ..Default::default()
        };
        assert!(odd.has_invalid_jury_size());
    }

    #[test]
    fn test_accepts_camel_case_keys() {
        let json = r#"{"realtimeSpeed": 2.5, "jurySize": 6, "enableObjections": false, "detailLevel": "full"}"#;
        let settings: SimulationSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.realtime_speed, 2.5);
        assert_eq!(settings.jury_size, 6);
        assert!(!settings.enable_objections);
        assert_eq!(settings.detail_level, DetailLevel::Full);
        assert!(settings.record_transcript);
    }
}
