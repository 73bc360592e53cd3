use thiserror::Error;

use super::TrialPhase;

/// Errors surfaced by the trial engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid phase transition {from} → {to}")]
    InvalidTransition { from: TrialPhase, to: TrialPhase },

    #[error("No case supplied to the courtroom")]
    MissingCase,

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The run was stopped; handlers unwind with this and the run loop
    /// turns it into a stopped outcome.
    #[error("Trial stopped")]
    Stopped,
}

pub type EngineResult<T> = Result<T, EngineError>;
