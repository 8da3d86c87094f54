//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Metrics → Store (snapshot + seeded subscriptions) → Notifier
//!     → Client pool + checker → Config watcher → Scheduler → Pipeline
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop ticking → Finish current round
//!     → Drain pipeline → Save snapshot → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: sinks before sources, scheduler last
//! - Fail fast on startup errors; runtime errors are logged and survived
//! - Shutdown has a deadline: a stuck round does not block exit

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
pub use startup::{run, StartupError};
