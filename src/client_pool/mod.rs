//! Client pool subsystem.
//!
//! # Data Flow
//! ```text
//! clients config (source addresses, timeout, headers)
//!     → descriptor.rs (one reqwest client per egress identity)
//!     → rotation.rs (fixed ordered pool)
//!     → scheduler consumer calls next() once per round
//!     → check protocol issues the round's requests through that client
//! ```
//!
//! # Design Decisions
//! - One pool per check protocol instance; distinct services never share one
//! - Single owner, so rotation needs no atomics or locks
//! - Pool size is fixed at start-up

pub mod descriptor;
pub mod rotation;

pub use descriptor::{ClientDescriptor, ClientPoolError};
pub use rotation::ClientPool;
