//! Roster checker: a JSON list of everyone currently online.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::checker::{BatchOutcome, CheckError, Checker};
use crate::client_pool::ClientDescriptor;
use crate::config::RosterConfig;
use crate::model::{EntityId, Status};

/// One online entity listed by a roster endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub entity: EntityId,
    pub image: Option<String>,
}

/// Checker backed by one or more roster endpoints.
pub struct RosterChecker {
    config: RosterConfig,
    verbose: bool,
}

impl RosterChecker {
    pub fn new(config: RosterConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    /// Decode a roster body into its entries.
    ///
    /// An element without the username field fails the whole body.
    pub fn decode(&self, body: &str) -> Result<Vec<RosterEntry>, CheckError> {
        let value: Value = serde_json::from_str(body).map_err(|e| CheckError::Decode(e.to_string()))?;

        let models = value
            .pointer(&self.config.models_pointer)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CheckError::Decode(format!("no array at '{}'", self.config.models_pointer))
            })?;

        models
            .iter()
            .enumerate()
            .map(|(i, model)| {
                let name = model
                    .get(&self.config.username_field)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CheckError::Decode(format!(
                            "element {} has no '{}' field",
                            i, self.config.username_field
                        ))
                    })?;
                let image = self
                    .config
                    .image_pointer
                    .as_deref()
                    .and_then(|pointer| model.pointer(pointer))
                    .and_then(Value::as_str)
                    .filter(|image| !image.is_empty())
                    .map(|image| format!("{}{}", self.config.image_prefix, image));

                Ok(RosterEntry {
                    entity: EntityId::new(name),
                    image,
                })
            })
            .collect()
    }

    async fn query_endpoint(
        &self,
        client: &ClientDescriptor,
        endpoint: &str,
    ) -> Result<Vec<RosterEntry>, CheckError> {
        let response = client.http.get(endpoint).send().await?;
        if response.status() != StatusCode::OK {
            return Err(CheckError::UnexpectedStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        let entries = self.decode(&body).inspect_err(|_| {
            if self.verbose {
                tracing::debug!(endpoint = %endpoint, response = %body, "Undecodable roster response");
            }
        })?;

        if entries.is_empty() {
            return Err(CheckError::ZeroResults);
        }
        Ok(entries)
    }
}

#[async_trait]
impl Checker for RosterChecker {
    fn name(&self) -> &'static str {
        "roster"
    }

    async fn check_single(&self, client: &ClientDescriptor, entity: &EntityId) -> Status {
        match self.check_batch(client, std::slice::from_ref(entity)).await {
            Ok(outcome) => outcome.statuses.get(entity).copied().unwrap_or(Status::Offline),
            Err(e) => {
                tracing::warn!(client = %client, entity = %entity, error = %e, "Roster check failed");
                Status::Unknown
            }
        }
    }

    /// Query every endpoint and merge the online sets.
    ///
    /// The roster is global, so `entities` is not sent upstream.
    async fn check_batch(
        &self,
        client: &ClientDescriptor,
        _entities: &[EntityId],
    ) -> Result<BatchOutcome, CheckError> {
        let mut outcome = BatchOutcome::default();
        for endpoint in &self.config.endpoints {
            for entry in self.query_endpoint(client, endpoint).await? {
                if let Some(image) = entry.image {
                    outcome.images.insert(entry.entity.clone(), image);
                }
                outcome.statuses.insert(entry.entity, Status::Online);
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(config: RosterConfig) -> RosterChecker {
        RosterChecker::new(config, false)
    }

    #[test]
    fn test_decode_plain_array() {
        let c = checker(RosterConfig::default());
        let entries = c.decode(r#"[{"username":"E1"},{"username":"Bob_2","extra":1}]"#).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entity.as_str(), "e1");
        assert_eq!(entries[1].entity.as_str(), "bob_2");
        assert!(entries[0].image.is_none());
    }

    #[test]
    fn test_decode_nested_models_and_images() {
        let c = checker(RosterConfig {
            models_pointer: "/models".into(),
            username_field: "nickname".into(),
            image_pointer: Some("/profile_images/thumb".into()),
            image_prefix: "https:".into(),
            ..RosterConfig::default()
        });
        let entries = c
            .decode(r#"{"models":[{"nickname":"Ann","profile_images":{"thumb":"//img.test/a.jpg"}}]}"#)
            .unwrap();
        assert_eq!(
            entries,
            vec![RosterEntry {
                entity: EntityId::new("ann"),
                image: Some("https://img.test/a.jpg".into()),
            }]
        );
    }

    #[test]
    fn test_missing_username_is_decode_error() {
        let c = checker(RosterConfig::default());
        let err = c.decode(r#"[{"username":"a"},{"name":"b"}]"#).unwrap_err();
        assert!(matches!(err, CheckError::Decode(msg) if msg.contains("element 1")));
    }

    #[test]
    fn test_not_an_array_is_decode_error() {
        let c = checker(RosterConfig::default());
        assert!(matches!(c.decode(r#"{"username":"a"}"#), Err(CheckError::Decode(_))));
        assert!(matches!(c.decode("<html>"), Err(CheckError::Decode(_))));
    }

    #[test]
    fn test_empty_array_decodes_to_nothing() {
        // the zero-results anomaly is raised by the endpoint query, not the decoder
        let c = checker(RosterConfig::default());
        assert!(c.decode("[]").unwrap().is_empty());
    }
}
