//! Pipeline health subsystem.
//!
//! # Data Flow
//! ```text
//! Every CheckResult:
//!     → window.rs (overwrite oldest sample with "was unknown?")
//!
//! Periodic timer (independent of polling):
//!     → monitor.rs counts unknowns
//!     → count > threshold and cooldown elapsed → HealthAlert
//!     → pipeline forwards the alert to the admin recipient
//! ```
//!
//! # Design Decisions
//! - Fixed window size, allocated once
//! - Cooldown prevents alert storms during long upstream outages
//! - Sustained classification failure is the only thing surfaced; single
//!   failed rounds are not alert-worthy

pub mod monitor;
pub mod window;

pub use monitor::{HealthAlert, HealthMonitor};
pub use window::ErrorWindow;
