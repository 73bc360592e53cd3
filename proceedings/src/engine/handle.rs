//! Cloneable view and control surface of a running courtroom.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::info;

use super::control::RunControl;
use super::state::Docket;
use super::{CourtAction, SimulationState, TrialPhase};
use crate::case::{Case, LegalSystem, Participant};
use crate::events::{SharedEventBus, TrialEvent};
use crate::transcript::{Ruling, TranscriptEntry};

/// Reads return copies; nothing handed out aliases engine state.
#[derive(Clone)]
pub struct CourtroomHandle {
    pub(crate) docket: Arc<RwLock<Docket>>,
    pub(crate) control: Arc<RunControl>,
    pub(crate) events: SharedEventBus,
}

impl CourtroomHandle {
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Docket> {
        self.docket.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Docket> {
        self.docket.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, event: TrialEvent) {
        self.events.publish(event);
    }

    // ── Read accessors ──────────────────────────────────────────────────

    pub fn get_current_phase(&self) -> TrialPhase {
        self.read().state.current_phase
    }

    pub fn get_transcript(&self) -> Vec<TranscriptEntry> {
        self.read().case.transcript().to_vec()
    }

    pub fn get_rulings(&self) -> Vec<Ruling> {
        self.read().case.rulings().to_vec()
    }

    pub fn get_action_history(&self) -> Vec<CourtAction> {
        self.read().actions.clone()
    }

    pub fn get_current_speaker(&self) -> Option<Participant> {
        let docket = self.read();
        let id = docket.state.current_speaker.as_deref()?;
        docket.case.participant(id).map(|p| Participant::clone(p))
    }

    pub fn get_state(&self) -> SimulationState {
        self.read().state.clone()
    }

    /// Snapshot of the case, transcript included.
    pub fn get_case(&self) -> Case {
        self.read().case.clone()
    }

    /// Running, not paused, not stopped.
    pub fn is_active(&self) -> bool {
        self.control.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn speed(&self) -> f64 {
        self.control.speed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrialEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> SharedEventBus {
        self.events.clone()
    }

    // ── Control ─────────────────────────────────────────────────────────

    /// No new step starts until `resume`; in-flight agent calls finish.
    pub fn pause(&self) -> bool {
        let paused = self.control.pause();
        if paused {
            let phase = self.get_current_phase();
            info!(phase = %phase, "Trial paused");
            self.publish(TrialEvent::SimulationPaused {
                phase,
                timestamp: Utc::now(),
            });
        }
        paused
    }

    pub fn resume(&self) -> bool {
        let resumed = self.control.resume();
        if resumed {
            let phase = self.get_current_phase();
            info!(phase = %phase, "Trial resumed");
            self.publish(TrialEvent::SimulationResumed {
                phase,
                timestamp: Utc::now(),
            });
        }
        resumed
    }

    /// Terminate the run. `is_active` is false once this returns.
    pub fn stop(&self) -> bool {
        let stopped = self.control.stop();
        if stopped {
            let phase = self.get_current_phase();
            info!(phase = %phase, "Trial stopped");
            self.publish(TrialEvent::SimulationStopped {
                phase,
                timestamp: Utc::now(),
            });
        }
        stopped
    }

    pub fn set_speed(&self, speed: f64) {
        self.control.set_speed(speed);
    }

    /// Takes effect at the next phase boundary.
    pub fn set_legal_system(&self, system: LegalSystem) {
        self.control.set_legal_system(system);
    }

    /// Takes effect at the next phase boundary.
    pub fn set_witnesses_enabled(&self, enabled: bool) {
        self.control.set_witnesses_enabled(enabled);
    }

    /// Ask for a sidebar at the next step; false when sidebars are disabled.
    pub fn request_sidebar(&self) -> bool {
        self.control.request_sidebar()
    }

    /// Close an open sidebar; false when none is open.
    pub fn end_sidebar(&self) -> bool {
        if !self.control.sidebar_enabled() || !self.read().state.sidebar_active {
            return false;
        }
        self.control.release_sidebar();
        true
    }
}

impl std::fmt::Debug for CourtroomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourtroomHandle")
            .field("phase", &self.get_current_phase())
            .field("active", &self.is_active())
            .finish()
    }
}
