//! Trial lifecycle events
//!
//! The engine publishes typed [`TrialEvent`]s on a broadcast [`EventBus`];
//! a presentation layer drains them at its own pace. Publishing never blocks
//! the engine, and a consumer that falls too far behind sees a lag error
//! rather than stalling the trial.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Courtroom   │────▶│  Event Bus   │────▶│  Subscribers │
//! │  (publish)   │     │  (broadcast) │     │   (recv)     │
//! └──────────────┘     └──────┬───────┘     └──────────────┘
//!                             │
//!                             ▼
//!                      ┌──────────────┐
//!                      │   Journal    │
//!                      │  (bounded)   │
//!                      └──────────────┘
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventBusExt, EventFilter, FilteredReceiver, SharedEventBus};
pub use types::TrialEvent;
