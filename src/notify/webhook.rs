//! Notifier posting JSON payloads to per-endpoint webhooks.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::model::{EntityId, Status};
use crate::notify::{Notifier, NotifyError};
use crate::store::Subscriber;

#[derive(Debug, Serialize)]
struct StatusPayload<'a> {
    endpoint: &'a str,
    subscriber: &'a str,
    entity: &'a str,
    status: Status,
}

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    endpoint: &'a str,
    subscriber: &'a str,
    alert: &'a str,
}

/// Delivers notifications as HTTP POSTs.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhooks: BTreeMap<String, String>,
}

impl WebhookNotifier {
    pub fn new(webhooks: BTreeMap<String, String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, webhooks })
    }

    async fn post<T: Serialize + Sync>(&self, endpoint: &str, payload: &T) -> Result<(), NotifyError> {
        let url = self
            .webhooks
            .get(endpoint)
            .ok_or_else(|| NotifyError::UnknownEndpoint(endpoint.to_string()))?;

        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subscriber: &Subscriber, entity: &EntityId, status: Status) -> Result<(), NotifyError> {
        let payload = StatusPayload {
            endpoint: &subscriber.endpoint,
            subscriber: &subscriber.id,
            entity: entity.as_str(),
            status,
        };
        self.post(&subscriber.endpoint, &payload).await
    }

    async fn alert(&self, recipient: &Subscriber, text: &str) -> Result<(), NotifyError> {
        let payload = AlertPayload {
            endpoint: &recipient.endpoint,
            subscriber: &recipient.id,
            alert: text,
        };
        self.post(&recipient.endpoint, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let notifier = WebhookNotifier::new(BTreeMap::new(), Duration::from_secs(1)).unwrap();
        let err = notifier
            .notify(&Subscriber::new("nowhere", "1"), &EntityId::new("a"), Status::Online)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::UnknownEndpoint(e) if e == "nowhere"));
    }

    #[test]
    fn test_payload_shape() {
        let payload = StatusPayload {
            endpoint: "main",
            subscriber: "42",
            entity: "alice",
            status: Status::Online,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"endpoint": "main", "subscriber": "42", "entity": "alice", "status": "online"})
        );
    }
}
