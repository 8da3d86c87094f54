//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for one monitored service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Check protocol variant and its settings.
    pub checker: CheckerConfig,

    /// Outbound client identities.
    pub clients: ClientsConfig,

    /// Polling schedule.
    pub polling: PollingConfig,

    /// Status transition / debounce rules.
    pub transitions: TransitionConfig,

    /// Error-rate monitoring.
    pub health: HealthConfig,

    /// Notification delivery.
    pub notifications: NotificationConfig,

    /// Bundled status store.
    pub store: StoreConfig,

    /// Subscriptions seeded into the store at start-up.
    pub subscriptions: Vec<SubscriptionConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Check protocol selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckerConfig {
    /// JSON roster of online entities.
    Roster(RosterConfig),
    /// HTTP status code of the profile page.
    Redirect(RedirectConfig),
    /// Rendered profile page markup.
    Markup(MarkupConfig),
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig::Roster(RosterConfig::default())
    }
}

/// Roster checker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Roster endpoints queried every round; results are merged.
    pub endpoints: Vec<String>,

    /// JSON pointer to the array inside the response ("" = the body is the array).
    pub models_pointer: String,

    /// Field of each array element holding the username.
    pub username_field: String,

    /// JSON pointer (relative to an element) of the thumbnail, if any.
    pub image_pointer: Option<String>,

    /// Prefix prepended to thumbnails (e.g. "https:" for protocol-relative URLs).
    pub image_prefix: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            models_pointer: String::new(),
            username_field: "username".to_string(),
            image_pointer: None,
            image_prefix: String::new(),
        }
    }
}

/// Redirect checker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedirectConfig {
    /// Profile URL template, `{id}` is replaced by the entity id.
    pub profile_url: String,

    /// When set, the profile URL answers JSON and this field holds
    /// "online" or "offline"; only 404 is read from the status code.
    pub status_field: Option<String>,
}

/// Markup checker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Profile URL template, `{id}` is replaced by the entity id.
    pub profile_url: String,

    /// Prerender service rendering client-side markup.
    pub renderer_url: String,

    /// Bounded wait for one of the markers to appear.
    pub timeout_secs: u64,

    /// Marker present when the stream is playing.
    pub media_selector: String,

    /// Marker present on a missing profile.
    pub not_found_selector: String,

    /// Marker present on a disabled account.
    pub disabled_selector: String,

    /// Element whose classes encode the presence.
    pub status_selector: String,

    /// Status classes meaning online.
    pub online_classes: Vec<String>,

    /// Status classes meaning offline.
    pub offline_classes: Vec<String>,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            profile_url: String::new(),
            renderer_url: String::new(),
            timeout_secs: 15,
            media_selector: "video".to_string(),
            not_found_selector: ".not-found-error".to_string(),
            disabled_selector: ".account-disabled-page".to_string(),
            status_selector: ".vc-status".to_string(),
            online_classes: vec![
                "status-p2p".to_string(),
                "status-private".to_string(),
                "status-groupShow".to_string(),
                "status-idle".to_string(),
            ],
            offline_classes: vec!["status-off".to_string()],
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientsConfig {
    /// Local source addresses, one client per address (empty = one unbound client).
    pub source_addresses: Vec<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Keep a cookie jar per client.
    pub enable_cookies: bool,

    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            source_addresses: Vec::new(),
            timeout_secs: 10,
            enable_cookies: false,
            headers: BTreeMap::new(),
        }
    }
}

/// Polling schedule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Interval between rounds in seconds.
    pub period_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { period_secs: 5 }
    }
}

/// Transition and debounce rules.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransitionConfig {
    /// Notify about every transition, including into offline.
    pub offline_notifications: bool,

    /// Minimum time since last seen online before an offline notice is sent.
    pub offline_threshold_secs: i64,

    /// Consecutive not-found rounds tolerated before the entity is dropped.
    pub not_found_threshold: u32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            offline_notifications: false,
            offline_threshold_secs: 1800,
            not_found_threshold: 5,
        }
    }
}

/// Error-rate monitoring.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Size of the rolling window of results.
    pub error_denominator: usize,

    /// Alert when more than this many results in the window were unknown.
    pub error_threshold: usize,

    /// Minimum time between two alerts.
    pub reporting_period_minutes: u64,

    /// How often the window is evaluated.
    pub check_interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            error_denominator: 100,
            error_threshold: 50,
            reporting_period_minutes: 60,
            check_interval_secs: 60,
        }
    }
}

/// Notification sender selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

/// Notification delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub sender: NotifierKind,

    /// Webhook URL per endpoint name.
    pub webhooks: BTreeMap<String, String>,

    /// Webhook request timeout in seconds.
    pub timeout_secs: u64,

    /// Endpoint receiving operational alerts.
    pub admin_endpoint: Option<String>,

    /// Subscriber receiving operational alerts.
    pub admin_subscriber: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sender: NotifierKind::Log,
            webhooks: BTreeMap::new(),
            timeout_secs: 10,
            admin_endpoint: None,
            admin_subscriber: None,
        }
    }
}

/// Bundled store settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot loaded at start-up and written at shutdown.
    pub snapshot_path: Option<String>,
}

/// One subscription seeded from configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionConfig {
    pub endpoint: String,
    pub subscriber: String,
    pub entity: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter listen address.
    pub metrics_address: String,

    pub log_format: LogFormat,

    /// Debug logging and raw response dumps.
    pub verbose: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            log_format: LogFormat::Pretty,
            verbose: false,
        }
    }
}
