//! Trial engine: phase machine, run control, and the handler table.
//!
//! ```text
//! CourtroomBuilder ──build──▶ Courtroom ──start()/spawn()──▶ TrialOutcome
//!                                 │
//!                                 ├── Jurisdiction ── HandlerTable (phase → handler)
//!                                 ├── AgentRoster   (participant → Agent)
//!                                 └── CourtroomHandle (reads, pause/resume/stop, sidebar)
//! ```

pub mod action;
pub mod control;
pub mod error;
pub mod handle;
pub mod handlers;
pub mod machine;
pub mod phase;
pub mod settings;
pub mod state;

pub use action::{ActionType, CourtAction};
pub use control::{scaled_delay, Pacing};
pub use error::{EngineError, EngineResult};
pub use handle::CourtroomHandle;
pub use handlers::{HandlerTable, PhaseHandler, MOTION_GRANT_PROBABILITY};
pub use machine::{Courtroom, CourtroomBuilder, TrialOutcome};
pub use phase::TrialPhase;
pub use settings::{DetailLevel, SimulationSettings, JURY_SIZE_RANGE};
pub use state::{PhaseTransition, SimulationState};
