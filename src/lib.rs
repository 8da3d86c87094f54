//! Siren: polling status monitor with change notifications.

pub mod checker;
pub mod client_pool;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod observability;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod transition;

pub use config::MonitorConfig;
pub use lifecycle::Shutdown;
pub use model::{CheckResult, EntityId, Status, StatusRecord};
