//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (periods > 0, threshold below window size)
//! - Check the selected checker has what it needs to issue requests
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::{CheckerConfig, MonitorConfig, NotifierKind};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("health.error_threshold ({threshold}) must be below health.error_denominator ({denominator})")]
    ThresholdTooHigh { threshold: usize, denominator: usize },

    #[error("roster checker needs at least one endpoint")]
    NoRosterEndpoints,

    #[error("{0} must contain the {{id}} placeholder")]
    MissingPlaceholder(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("invalid source address '{0}'")]
    InvalidSourceAddress(String),

    #[error("no webhook configured for endpoint '{0}'")]
    MissingWebhook(String),

    #[error("{field} must be empty or a JSON pointer starting with '/', got '{value}'")]
    InvalidPointer { field: &'static str, value: String },
}

fn check_pointer(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.is_empty() && !value.starts_with('/') {
        errors.push(ValidationError::InvalidPointer {
            field,
            value: value.to_string(),
        });
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match &config.checker {
        CheckerConfig::Roster(roster) => {
            if roster.endpoints.is_empty() {
                errors.push(ValidationError::NoRosterEndpoints);
            }
            if roster.username_field.is_empty() {
                errors.push(ValidationError::Empty("checker.username_field"));
            }
            check_pointer(&mut errors, "checker.models_pointer", &roster.models_pointer);
            if let Some(pointer) = &roster.image_pointer {
                check_pointer(&mut errors, "checker.image_pointer", pointer);
            }
        }
        CheckerConfig::Redirect(redirect) => {
            if !redirect.profile_url.contains("{id}") {
                errors.push(ValidationError::MissingPlaceholder("checker.profile_url"));
            }
            if redirect.status_field.as_deref() == Some("") {
                errors.push(ValidationError::Empty("checker.status_field"));
            }
        }
        CheckerConfig::Markup(markup) => {
            if !markup.profile_url.contains("{id}") {
                errors.push(ValidationError::MissingPlaceholder("checker.profile_url"));
            }
            if markup.renderer_url.is_empty() {
                errors.push(ValidationError::Empty("checker.renderer_url"));
            }
            if markup.timeout_secs == 0 {
                errors.push(ValidationError::Zero("checker.timeout_secs"));
            }
        }
    }

    for address in &config.clients.source_addresses {
        if address.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::InvalidSourceAddress(address.clone()));
        }
    }
    if config.clients.timeout_secs == 0 {
        errors.push(ValidationError::Zero("clients.timeout_secs"));
    }
    if config.polling.period_secs == 0 {
        errors.push(ValidationError::Zero("polling.period_secs"));
    }
    if config.health.error_denominator == 0 {
        errors.push(ValidationError::Zero("health.error_denominator"));
    } else if config.health.error_threshold >= config.health.error_denominator {
        errors.push(ValidationError::ThresholdTooHigh {
            threshold: config.health.error_threshold,
            denominator: config.health.error_denominator,
        });
    }
    if config.health.check_interval_secs == 0 {
        errors.push(ValidationError::Zero("health.check_interval_secs"));
    }

    if config.notifications.sender == NotifierKind::Webhook {
        for subscription in &config.subscriptions {
            if !config.notifications.webhooks.contains_key(&subscription.endpoint) {
                errors.push(ValidationError::MissingWebhook(subscription.endpoint.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RedirectConfig, RosterConfig, SubscriptionConfig};

    fn roster_config() -> MonitorConfig {
        MonitorConfig {
            checker: CheckerConfig::Roster(RosterConfig {
                endpoints: vec!["http://127.0.0.1/online".into()],
                ..RosterConfig::default()
            }),
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&roster_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = roster_config();
        config.checker = CheckerConfig::Redirect(RedirectConfig {
            profile_url: "https://site.test/".into(),
            ..RedirectConfig::default()
        });
        config.polling.period_secs = 0;
        config.health.error_threshold = 100;
        config.clients.source_addresses.push("not-an-ip".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MissingPlaceholder("checker.profile_url")));
        assert!(errors.contains(&ValidationError::Zero("polling.period_secs")));
        assert!(errors.contains(&ValidationError::InvalidSourceAddress("not-an-ip".into())));
    }

    #[test]
    fn test_roster_pointers_must_be_json_pointers() {
        let mut config = roster_config();
        if let CheckerConfig::Roster(roster) = &mut config.checker {
            roster.models_pointer = "models".into();
            roster.image_pointer = Some("/thumb".into());
        }
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidPointer {
                field: "checker.models_pointer",
                value: "models".into(),
            }]
        );

        if let CheckerConfig::Roster(roster) = &mut config.checker {
            roster.models_pointer = "/data/models".into();
        }
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_status_field_rejected() {
        let mut config = roster_config();
        config.checker = CheckerConfig::Redirect(RedirectConfig {
            profile_url: "https://site.test/{id}.json".into(),
            status_field: Some(String::new()),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::Empty("checker.status_field")]);
    }

    #[test]
    fn test_webhook_sender_requires_urls() {
        let mut config = roster_config();
        config.notifications.sender = NotifierKind::Webhook;
        config.subscriptions.push(SubscriptionConfig {
            endpoint: "main".into(),
            subscriber: "1".into(),
            entity: "alice".into(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingWebhook("main".into())]);
    }
}
