//! Status transition subsystem.
//!
//! # Data Flow
//! ```text
//! CheckResult from the scheduler
//!     → engine.rs loads the entity's StatusRecord
//!     → not-found streak / debounce rules
//!     → record persisted (or deleted)
//!     → Transition handed back to the pipeline for dispatch
//! ```
//!
//! # Design Decisions
//! - Decisions are a pure function of (previous record, observation, now)
//! - Records are written on every classified observation, notified or not
//! - Going online is always eligible; everything else is subject to the
//!   offline-notification setting and the debounce window

pub mod engine;

pub use engine::{Decision, RecordChange, Transition, TransitionEngine};
