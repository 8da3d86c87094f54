//! Result-processing pipeline.
//!
//! # Data Flow
//! ```text
//! RoundEvent::Result
//!     → health window (every result, unknown or not)
//!     → unknown? stop
//!     → no subscribers? stop
//!     → TransitionEngine::apply (read, decide, persist)
//!     → Notify(status) → Notifier::notify per subscriber
//!     → Removed        → Notifier::notify(NotFound) per subscriber, unsubscribe all
//!
//! Health timer
//!     → HealthMonitor::evaluate → Notifier::alert(admin)
//!
//! Config reload
//!     → reload.rs splits into poll interval (scheduler) and rules (engine)
//! ```
//!
//! # Design Decisions
//! - One task processes results sequentially, so per-entity writes never race
//! - Delivery failures are logged and never roll back stored state
//! - The loop ends when the scheduler closes its event stream

pub mod monitor;
pub mod reload;

pub use monitor::Monitor;
pub use reload::{fan_out_config, ReloadChannels};
