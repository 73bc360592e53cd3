//! Run control: lifecycle, pause gate, stop token, pacing, and deferred
//! configuration changes.
//!
//! Shared between the running engine and every [`CourtroomHandle`](super::CourtroomHandle).
//! The engine only looks at it at suspension points, so a control call takes
//! effect at the next step boundary at the latest.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

use super::{EngineError, EngineResult};
use crate::case::LegalSystem;

/// Base delays, scaled by the run's speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    /// Pause after every recorded action
    pub action_delay: Duration,
    /// Jury "thinking time" before ballots are cast
    pub deliberation_time: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            action_delay: Duration::from_millis(1000),
            deliberation_time: Duration::from_millis(3000),
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            action_delay: Duration::ZERO,
            deliberation_time: Duration::ZERO,
        }
    }
}

/// `base / speed`; non-positive or non-finite speed means no delay.
pub fn scaled_delay(base: Duration, speed: f64) -> Duration {
    if !speed.is_finite() || speed <= 0.0 || base.is_zero() {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(base.as_secs_f64() / speed).unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Lifecycle {
    Idle = 0,
    Running = 1,
    Finished = 2,
    Stopped = 3,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Running,
            2 => Self::Finished,
            3 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Configuration changes applied at the next phase boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PendingChanges {
    pub legal_system: Option<LegalSystem>,
    pub witnesses_enabled: Option<bool>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.legal_system.is_none() && self.witnesses_enabled.is_none()
    }
}

pub(crate) struct RunControl {
    lifecycle: AtomicU8,
    paused: watch::Sender<bool>,
    cancel: CancellationToken,
    speed_bits: AtomicU64,
    sidebar_enabled: bool,
    sidebar_requested: AtomicBool,
    sidebar_release: Notify,
    pending: Mutex<PendingChanges>,
}

impl RunControl {
    pub fn new(speed: f64, sidebar_enabled: bool) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            lifecycle: AtomicU8::new(Lifecycle::Idle as u8),
            paused,
            cancel: CancellationToken::new(),
            speed_bits: AtomicU64::new(speed.to_bits()),
            sidebar_enabled,
            sidebar_requested: AtomicBool::new(false),
            sidebar_release: Notify::new(),
            pending: Mutex::new(PendingChanges::default()),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::SeqCst))
    }

    /// Idle → Running; anything else is rejected untouched.
    pub fn begin(&self) -> EngineResult<()> {
        self.lifecycle
            .compare_exchange(
                Lifecycle::Idle as u8,
                Lifecycle::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(|_| ())
            .map_err(|actual| {
                EngineError::InvalidState(format!(
                    "cannot start a trial that is {}",
                    Lifecycle::from_u8(actual)
                ))
            })
    }

    /// Running → Finished.
    pub fn finish(&self) {
        let _ = self.lifecycle.compare_exchange(
            Lifecycle::Running as u8,
            Lifecycle::Finished as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Stop the run; returns whether this call did it.
    pub fn stop(&self) -> bool {
        let mut current = self.lifecycle.load(Ordering::SeqCst);
        loop {
            match Lifecycle::from_u8(current) {
                Lifecycle::Idle | Lifecycle::Running => {}
                Lifecycle::Finished | Lifecycle::Stopped => return false,
            }
            match self.lifecycle.compare_exchange(
                current,
                Lifecycle::Stopped as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        self.cancel.cancel();
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Running and not paused.
    pub fn is_active(&self) -> bool {
        self.lifecycle() == Lifecycle::Running && !self.is_paused() && !self.is_stopped()
    }

    pub fn ensure_not_stopped(&self) -> EngineResult<()> {
        if self.is_stopped() {
            Err(EngineError::Stopped)
        } else {
            Ok(())
        }
    }

    // ── Pause gate ──────────────────────────────────────────────────────

    /// Returns whether the run went from running to paused.
    pub fn pause(&self) -> bool {
        if self.lifecycle() != Lifecycle::Running {
            return false;
        }
        !self.paused.send_replace(true)
    }

    /// Returns whether the run was paused.
    pub fn resume(&self) -> bool {
        self.paused.send_replace(false)
    }

    /// Hold here while paused; a stop releases the hold with `Stopped`.
    pub async fn wait_while_paused(&self) -> EngineResult<()> {
        let mut rx = self.paused.subscribe();
        loop {
            self.ensure_not_stopped()?;
            let paused = *rx.borrow_and_update();
            if !paused {
                return Ok(());
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(EngineError::Stopped),
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Err(EngineError::Stopped);
                    }
                }
            }
        }
    }

    // ── Pacing ──────────────────────────────────────────────────────────

    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed_bits.load(Ordering::SeqCst))
    }

    pub fn set_speed(&self, speed: f64) {
        self.speed_bits.store(speed.to_bits(), Ordering::SeqCst);
    }

    /// Sleep `base` scaled by speed, waking early on stop.
    pub async fn pace(&self, base: Duration) -> EngineResult<()> {
        self.ensure_not_stopped()?;
        let delay = scaled_delay(base, self.speed());
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(EngineError::Stopped),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    // ── Sidebar ─────────────────────────────────────────────────────────

    pub fn sidebar_enabled(&self) -> bool {
        self.sidebar_enabled
    }

    /// No-op (returns false) when sidebars are disabled.
    pub fn request_sidebar(&self) -> bool {
        if !self.sidebar_enabled {
            return false;
        }
        self.sidebar_requested.store(true, Ordering::SeqCst);
        true
    }

    pub fn take_sidebar_request(&self) -> bool {
        self.sidebar_requested.swap(false, Ordering::SeqCst)
    }

    pub fn release_sidebar(&self) {
        self.sidebar_release.notify_one();
    }

    pub async fn wait_sidebar_release(&self) -> EngineResult<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(EngineError::Stopped),
            _ = self.sidebar_release.notified() => Ok(()),
        }
    }

    // ── Deferred configuration ──────────────────────────────────────────

    pub fn set_legal_system(&self, system: LegalSystem) {
        if let Ok(mut p) = self.pending.lock() {
            p.legal_system = Some(system);
        }
    }

    pub fn set_witnesses_enabled(&self, enabled: bool) {
        if let Ok(mut p) = self.pending.lock() {
            p.witnesses_enabled = Some(enabled);
        }
    }

    pub fn take_pending(&self) -> PendingChanges {
        self.pending
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }
}
