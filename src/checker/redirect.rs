//! Redirect checker: the profile page's status code is the presence.
//!
//! Services answering JSON profiles set `status_field`; then only a 404 is
//! read from the code and a 200 body carries "online" or "offline".

use async_trait::async_trait;
use reqwest::Response;
use serde_json::Value;

use crate::checker::{profile_url, CheckError, Checker};
use crate::client_pool::ClientDescriptor;
use crate::model::{EntityId, Status};

/// Map a profile page status code to a presence.
pub fn classify_status_code(code: u16) -> Status {
    match code {
        200 => Status::Online,
        302 => Status::Offline,
        404 => Status::NotFound,
        _ => Status::Unknown,
    }
}

/// Read a JSON profile's room status field.
pub fn classify_status_field(body: &str, field: &str) -> Result<Status, CheckError> {
    let value: Value = serde_json::from_str(body).map_err(|e| CheckError::Decode(e.to_string()))?;
    let room = value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CheckError::Decode(format!("no '{}' field", field)))?;

    match room {
        "online" => Ok(Status::Online),
        "offline" => Ok(Status::Offline),
        other => Err(CheckError::Decode(format!("cannot parse room status \"{}\"", other))),
    }
}

/// Checker issuing one GET per entity against its profile URL.
pub struct RedirectChecker {
    profile_url: String,
    status_field: Option<String>,
    verbose: bool,
}

impl RedirectChecker {
    /// `profile_url` contains `{id}`, replaced by the entity id.
    pub fn new(profile_url: String) -> Self {
        Self {
            profile_url,
            status_field: None,
            verbose: false,
        }
    }

    /// Classify 200 answers by a JSON status field instead of the code alone.
    pub fn with_status_field(mut self, field: String, verbose: bool) -> Self {
        self.status_field = Some(field);
        self.verbose = verbose;
        self
    }

    async fn read_status_field(&self, response: Response, field: &str) -> Result<Status, CheckError> {
        let body = response.text().await?;
        classify_status_field(&body, field).inspect_err(|_| {
            if self.verbose {
                tracing::debug!(response = %body, "Undecodable profile response");
            }
        })
    }
}

#[async_trait]
impl Checker for RedirectChecker {
    fn name(&self) -> &'static str {
        "redirect"
    }

    async fn check_single(&self, client: &ClientDescriptor, entity: &EntityId) -> Status {
        let url = profile_url(&self.profile_url, entity);
        let response = match client.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(client = %client, entity = %entity, error = %e, "Profile query failed");
                return Status::Unknown;
            }
        };

        let code = response.status().as_u16();
        let status = match (&self.status_field, code) {
            (Some(_), 404) => Status::NotFound,
            (Some(field), 200) => match self.read_status_field(response, field).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(client = %client, entity = %entity, error = %e, "Cannot read profile status");
                    return Status::Unknown;
                }
            },
            (Some(_), _) => Status::Unknown,
            (None, code) => classify_status_code(code),
        };

        if status == Status::Unknown {
            tracing::warn!(client = %client, entity = %entity, code, "Unexpected profile status code");
        }
        status
    }
}
