//! Core data model.
//!
//! # Types
//! - `EntityId`: canonical identifier, the only key used internally
//! - `Status`: one round's classification of an entity
//! - `StatusRecord`: persisted state the transition engine works against
//! - `CheckResult`: ephemeral per-round result emitted by the scheduler

pub mod entity;
pub mod status;

pub use entity::{EntityId, EntityIdError};
pub use status::{unix_now, CheckResult, Status, StatusRecord};
