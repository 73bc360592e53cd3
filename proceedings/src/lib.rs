//! Trial Proceedings Engine
//!
//! Drives a simulated courtroom trial from pre-trial through verdict (and
//! sentencing where it applies), coordinating AI-driven participants
//! through a fixed phase machine.
//!
//! # Components
//!
//! - `engine`: phase machine, run control, handler table, read accessors
//! - `turn`: witness examination and the role-opposition table
//! - `objection`: objection draws and the judge's rulings
//! - `verdict`: bench scoring, juror ballots, jury majorities
//! - `jurisdiction`: handler-table overrides per legal system (Louisiana)
//! - `agent`: the capability each participant exposes, plus persona,
//!   human, and scripted implementations
//! - `backend`: model endpoints, a capacity-aware pool, batch fan-out
//! - `events`: typed lifecycle events on a broadcast bus
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use proceedings::{Case, CaseType, Courtroom, Participant, Role, ScriptedAgent};
//!
//! # async fn run() -> Result<(), proceedings::EngineError> {
//! let case = Case::new("State v. Doe", CaseType::Criminal)
//!     .with_participant(Participant::new("judge", "Judge Reyes", Role::Judge))
//!     .with_participant(Participant::new("da", "Ms. Park", Role::Prosecutor));
//!
//! let mut court = Courtroom::builder()
//!     .case(case)
//!     .agent("judge", Arc::new(ScriptedAgent::constant("So ordered.")))
//!     .seed(7)
//!     .build()?;
//! let outcome = court.start().await?;
//! println!("{:?}", outcome.verdict);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod backend;
pub mod case;
pub mod config;
pub mod engine;
pub mod events;
pub mod jurisdiction;
pub mod objection;
pub mod random;
pub mod transcript;
pub mod turn;
pub mod verdict;

pub use agent::{
    fallback_statement, Agent, AgentError, AgentResult, AgentRoster, HumanAgent, HumanInput,
    PersonaAgent, PromptContext, ScriptedAgent,
};
pub use backend::{
    generate_batch, BackendError, BackendPool, BackendResult, ModelBackend, OllamaBackend,
    PoolError,
};
pub use case::{
    load_case, Case, CaseError, CaseResult, CaseType, Evidence, LegalSystem, Participant,
    Personality, Role, Side,
};
pub use config::{ConfigError, ConfigResult, CourtroomConfig};
pub use engine::{
    ActionType, CourtAction, Courtroom, CourtroomBuilder, CourtroomHandle, DetailLevel,
    EngineError, EngineResult, HandlerTable, Pacing, PhaseHandler, SimulationSettings,
    SimulationState, TrialOutcome, TrialPhase,
};
pub use events::{EventBus, EventFilter, SharedEventBus, TrialEvent};
pub use jurisdiction::Jurisdiction;
pub use objection::{ObjectionPolicy, ObjectionType};
pub use random::{FixedSequence, RandomSource, SeededRandom};
pub use transcript::{Decision, EntryKind, Ruling, RulingKind, TranscriptEntry};
pub use turn::OppositionTable;
pub use verdict::{JuryTally, MajorityRule, Verdict, VerdictCalculator, VerdictFinding};
