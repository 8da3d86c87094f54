//! Polling scheduler.
//!
//! # Data Flow
//! ```text
//! Interval tick
//!     → WatchList::watched_entities
//!     → request queue (capacity 1, try_send: skip the tick when full)
//!     → consumer: ClientPool::next → Checker::check_batch
//!     → RoundEvent::Result per entity, then RoundEvent::Completed
//!     → pipeline
//! ```
//!
//! # Design Decisions
//! - Exactly one round in flight and at most one queued; ticks beyond that are
//!   dropped rather than buffered
//! - Each round uses the next client in the pool
//! - A failed round still produces one (unknown) result per entity so the
//!   health window sees it

pub mod batch;

pub use batch::{round_results, BatchScheduler, RoundEvent, SchedulerHandle};
