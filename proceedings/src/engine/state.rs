//! Working state of a run and the transition rules that guard it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CourtAction, EngineError, EngineResult, TrialPhase};
use crate::case::{Case, ParticipantId};
use crate::objection::PendingObjection;
use crate::verdict::Verdict;

/// A phase transition record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// `None` for the first phase of the run.
    pub from: Option<TrialPhase>,
    pub to: TrialPhase,
    pub timestamp: DateTime<Utc>,
}

/// Engine-owned state; never persisted in the case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub current_phase: TrialPhase,
    pub current_speaker: Option<ParticipantId>,
    pub current_witness: Option<ParticipantId>,
    pub introduced_evidence: BTreeSet<String>,
    pub pending_objection: Option<PendingObjection>,
    pub sidebar_active: bool,
    pub jury_deliberating: bool,
    pub completed: bool,
    pub verdict: Option<Verdict>,
    /// The jury reached neither majority.
    pub hung_jury: bool,
    pub transitions: Vec<PhaseTransition>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phases entered so far, in order.
    pub fn phases_entered(&self) -> Vec<TrialPhase> {
        self.transitions.iter().map(|t| t.to).collect()
    }

    pub fn last_phase(&self) -> Option<TrialPhase> {
        self.transitions.last().map(|t| t.to)
    }

    /// Move forward to `to`.
    ///
    /// Rejects anything that is not strictly later than the current phase,
    /// and anything other than sentencing once a verdict is in.
    pub fn transition(&mut self, to: TrialPhase) -> EngineResult<()> {
        let from = self.last_phase();
        if let Some(from) = from {
            if to.ordinal() <= from.ordinal() {
                return Err(EngineError::InvalidTransition { from, to });
            }
        }
        if self.verdict.is_some() && to != TrialPhase::Sentencing {
            return Err(EngineError::InvalidState(format!(
                "verdict already delivered; cannot enter {to}"
            )));
        }

        self.transitions.push(PhaseTransition {
            from,
            to,
            timestamp: Utc::now(),
        });
        self.current_phase = to;
        Ok(())
    }

    /// Put a witness on the stand.
    pub fn call_witness(&mut self, witness: &str) -> EngineResult<()> {
        if let Some(current) = &self.current_witness {
            return Err(EngineError::InvalidState(format!(
                "witness {current} is still on the stand"
            )));
        }
        self.current_witness = Some(witness.to_string());
        Ok(())
    }

    pub fn dismiss_witness(&mut self) {
        self.current_witness = None;
    }

    /// Set the verdict and completion together; only once per run.
    pub fn deliver_verdict(&mut self, verdict: Verdict, hung: bool) -> EngineResult<()> {
        if self.completed {
            return Err(EngineError::InvalidState(
                "verdict already delivered".to_string(),
            ));
        }
        self.verdict = Some(verdict);
        self.hung_jury = hung;
        self.completed = true;
        Ok(())
    }
}

/// Everything a run mutates, behind one lock.
#[derive(Debug, Clone)]
pub(crate) struct Docket {
    pub case: Case,
    pub state: SimulationState,
    pub actions: Vec<CourtAction>,
}

impl Docket {
    pub fn new(case: Case) -> Self {
        Self {
            case,
            state: SimulationState::new(),
            actions: Vec::new(),
        }
    }
}
