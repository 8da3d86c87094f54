//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → cloned into each subsystem at construction
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → pushed on an update channel
//!     → pipeline applies poll interval and transition rules
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Only the poll interval and transition rules are hot-reloadable;
//!   clients, checker and health window are fixed for the process lifetime
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
pub use schema::{
    CheckerConfig, ClientsConfig, HealthConfig, LogFormat, MarkupConfig, MonitorConfig,
    NotificationConfig, NotifierKind, ObservabilityConfig, PollingConfig, RedirectConfig,
    RosterConfig, StoreConfig, SubscriptionConfig, TransitionConfig,
};
