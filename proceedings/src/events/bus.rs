//! Event bus for trial lifecycle events
//!
//! Provides pub/sub messaging using Tokio broadcast channels with an
//! optional bounded in-memory journal for late subscribers and replay.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::debug;

use super::types::TrialEvent;
use crate::engine::TrialPhase;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 1024;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Event bus with broadcast channels and an optional journal
pub struct EventBus {
    /// Broadcast sender for publishing events
    sender: broadcast::Sender<TrialEvent>,

    /// Most recent events, oldest first, when journaling is enabled
    journal: Option<Mutex<VecDeque<TrialEvent>>>,

    /// Maximum journal length
    journal_limit: usize,
}

impl EventBus {
    /// Create a new event bus without a journal
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            journal: None,
            journal_limit: 0,
        }
    }

    /// Create an event bus that keeps the last `limit` events
    pub fn with_journal(limit: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            journal: Some(Mutex::new(VecDeque::with_capacity(limit.min(4096)))),
            journal_limit: limit,
        }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers, returning how many received it
    pub fn publish(&self, event: TrialEvent) -> usize {
        let event_type = event.event_type();

        if let Some(journal) = &self.journal {
            if let Ok(mut journal) = journal.lock() {
                if journal.len() == self.journal_limit && self.journal_limit > 0 {
                    journal.pop_front();
                }
                if self.journal_limit > 0 {
                    journal.push_back(event.clone());
                }
            }
        }

        // No receivers is OK - the engine never waits on consumers
        match self.sender.send(event) {
            Ok(count) => {
                debug!(event_type, receivers = count, "Event published");
                count
            }
            Err(_) => {
                debug!(event_type, "Event published (no receivers)");
                0
            }
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<TrialEvent> {
        self.sender.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if the bus has any subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Snapshot of the journal, oldest first (empty when journaling is off)
    pub fn journal(&self) -> Vec<TrialEvent> {
        match &self.journal {
            Some(journal) => journal
                .lock()
                .map(|j| j.iter().cloned().collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event filter for selective subscription
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by phase
    pub phase: Option<TrialPhase>,
    /// Filter by event types
    pub event_types: Option<Vec<String>>,
}

impl EventFilter {
    /// Create a new empty filter (matches all events)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by phase
    pub fn phase(mut self, phase: TrialPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Filter by event types
    pub fn types(mut self, event_types: Vec<&str>) -> Self {
        self.event_types = Some(event_types.into_iter().map(String::from).collect());
        self
    }

    /// Check if an event matches this filter
    pub fn matches(&self, event: &TrialEvent) -> bool {
        if let Some(phase) = self.phase {
            if let Some(event_phase) = event.phase() {
                if event_phase != phase {
                    return false;
                }
            }
        }

        if let Some(ref types) = self.event_types {
            if !types.iter().any(|t| t == event.event_type()) {
                return false;
            }
        }

        true
    }
}

/// Filtered event receiver that only yields matching events
pub struct FilteredReceiver {
    receiver: broadcast::Receiver<TrialEvent>,
    filter: EventFilter,
}

impl FilteredReceiver {
    /// Create a new filtered receiver
    pub fn new(receiver: broadcast::Receiver<TrialEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next matching event
    pub async fn recv(&mut self) -> Result<TrialEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.filter.matches(&event) {
                return Ok(event);
            }
        }
    }
}

/// Extension trait for subscribing with filters
pub trait EventBusExt {
    /// Subscribe with a filter
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver;
}

impl EventBusExt for EventBus {
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}

impl EventBusExt for SharedEventBus {
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}
