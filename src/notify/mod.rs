//! Notification dispatch boundary.
//!
//! # Data Flow
//! ```text
//! Pipeline decides a transition
//!     → Notifier::notify(subscriber, entity, status) per subscriber
//! Health monitor raises an alert
//!     → Notifier::alert(admin, text)
//! ```
//!
//! # Design Decisions
//! - Delivery is external: formatting, localization and retries live behind the trait
//! - Delivery failures are logged by the caller and never affect status state

pub mod log;
pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{EntityId, Status};
use crate::store::Subscriber;

pub use self::log::LogNotifier;
pub use self::webhook::WebhookNotifier;

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no delivery route for endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),

    #[error("delivery rejected with status {0}")]
    Rejected(u16),
}

/// Sends decided status changes and operational alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell a subscriber about an entity's new status.
    ///
    /// `Status::NotFound` means the entity was dropped as permanently gone.
    async fn notify(&self, subscriber: &Subscriber, entity: &EntityId, status: Status) -> Result<(), NotifyError>;

    /// Deliver an operational alert.
    async fn alert(&self, recipient: &Subscriber, text: &str) -> Result<(), NotifyError>;
}
