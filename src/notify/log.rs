//! Notifier writing every notification to the log.

use async_trait::async_trait;

use crate::model::{EntityId, Status};
use crate::notify::{Notifier, NotifyError};
use crate::store::Subscriber;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subscriber: &Subscriber, entity: &EntityId, status: Status) -> Result<(), NotifyError> {
        tracing::info!(
            endpoint = %subscriber.endpoint,
            subscriber = %subscriber.id,
            entity = %entity,
            status = %status,
            "Status notification"
        );
        Ok(())
    }

    async fn alert(&self, recipient: &Subscriber, text: &str) -> Result<(), NotifyError> {
        tracing::warn!(
            endpoint = %recipient.endpoint,
            subscriber = %recipient.id,
            alert = %text,
            "Operational alert"
        );
        Ok(())
    }
}
