//! Markup checker: presence is only visible in client-rendered markup.
//!
//! # Responsibilities
//! - Ask a renderer for the fully rendered profile page, with a bounded wait
//! - Look for the configured markers in the rendered markup
//! - Map markers and status classes to a presence
//!
//! # Design Decisions
//! - Rendering is behind `PageRenderer` so classification is testable on canned markup
//! - Marker precedence: media, not-found, disabled, status element
//! - Anything unrecognized is Unknown and logged with the classes seen

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use url::Url;

use crate::checker::{profile_url, CheckError, Checker};
use crate::client_pool::ClientDescriptor;
use crate::config::MarkupConfig;
use crate::model::{EntityId, Status};

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>").expect("valid tag regex"));
static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid class regex")
});

/// Produces rendered markup for a page.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `url`, waiting for any element matching `wait_for` (comma separated).
    async fn render(&self, client: &ClientDescriptor, url: &str, wait_for: &str) -> Result<String, CheckError>;
}

/// Renderer backed by an HTTP prerender service.
///
/// `GET <endpoint>?url=<page>&waitFor=<selectors>` returns the rendered HTML.
pub struct PrerenderService {
    endpoint: String,
    wait: Duration,
}

impl PrerenderService {
    /// `wait` replaces the pooled client's timeout for render requests, which
    /// may legitimately take longer than an ordinary page fetch.
    pub fn new(endpoint: String, wait: Duration) -> Self {
        Self { endpoint, wait }
    }
}

#[async_trait]
impl PageRenderer for PrerenderService {
    async fn render(&self, client: &ClientDescriptor, url: &str, wait_for: &str) -> Result<String, CheckError> {
        let request_url = Url::parse_with_params(&self.endpoint, &[("url", url), ("waitFor", wait_for)])
            .map_err(|e| CheckError::Decode(format!("invalid renderer url: {}", e)))?;

        let response = client.http.get(request_url).timeout(self.wait).send().await?;
        if response.status() != StatusCode::OK {
            return Err(CheckError::UnexpectedStatus(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// A simple CSS selector: `tag` or `.class`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Tag(String),
    Class(String),
}

impl Selector {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix('.') {
            Some(class) => Selector::Class(class.to_string()),
            None => Selector::Tag(raw.to_ascii_lowercase()),
        }
    }

    fn matches(&self, element: &Element) -> bool {
        match self {
            Selector::Tag(tag) => element.tag == *tag,
            Selector::Class(class) => element.classes.iter().any(|c| c == class),
        }
    }
}

/// An opening tag found in rendered markup.
#[derive(Debug)]
struct Element {
    tag: String,
    classes: Vec<String>,
}

fn scan_elements(html: &str) -> Vec<Element> {
    OPEN_TAG_RE
        .captures_iter(html)
        .map(|caps| {
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            let classes = CLASS_ATTR_RE
                .captures(attrs)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
            Element {
                tag: caps[1].to_ascii_lowercase(),
                classes,
            }
        })
        .collect()
}

/// Checker classifying rendered profile pages.
pub struct MarkupChecker {
    profile_url: String,
    timeout: Duration,
    renderer: Arc<dyn PageRenderer>,
    media: Selector,
    not_found: Selector,
    disabled: Selector,
    status: Selector,
    wait_for: String,
    online_classes: HashSet<String>,
    offline_classes: HashSet<String>,
}

impl MarkupChecker {
    pub fn new(config: MarkupConfig, renderer: Arc<dyn PageRenderer>) -> Self {
        let wait_for = [
            &config.media_selector,
            &config.status_selector,
            &config.disabled_selector,
            &config.not_found_selector,
        ]
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            profile_url: config.profile_url,
            timeout: Duration::from_secs(config.timeout_secs),
            renderer,
            media: Selector::parse(&config.media_selector),
            not_found: Selector::parse(&config.not_found_selector),
            disabled: Selector::parse(&config.disabled_selector),
            status: Selector::parse(&config.status_selector),
            wait_for,
            online_classes: config.online_classes.into_iter().collect(),
            offline_classes: config.offline_classes.into_iter().collect(),
        }
    }

    /// Classify rendered markup.
    pub fn classify(&self, html: &str) -> Result<Status, CheckError> {
        let elements = scan_elements(html);
        let present = |selector: &Selector| elements.iter().any(|e| selector.matches(e));

        if present(&self.media) {
            return Ok(Status::Online);
        }
        if present(&self.not_found) {
            return Ok(Status::NotFound);
        }
        if present(&self.disabled) {
            return Ok(Status::Denied);
        }

        let Some(status_element) = elements.iter().find(|e| self.status.matches(e)) else {
            return Err(CheckError::UnrecognizedMarkup(Vec::new()));
        };
        for class in &status_element.classes {
            if self.offline_classes.contains(class) {
                return Ok(Status::Offline);
            }
            if self.online_classes.contains(class) {
                return Ok(Status::Online);
            }
        }
        Err(CheckError::UnrecognizedMarkup(status_element.classes.clone()))
    }
}

#[async_trait]
impl Checker for MarkupChecker {
    fn name(&self) -> &'static str {
        "markup"
    }

    async fn check_single(&self, client: &ClientDescriptor, entity: &EntityId) -> Status {
        let url = profile_url(&self.profile_url, entity);
        let rendered = tokio::time::timeout(self.timeout, self.renderer.render(client, &url, &self.wait_for))
            .await
            .unwrap_or(Err(CheckError::RenderTimeout(self.timeout.as_secs())));

        let html = match rendered {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(client = %client, entity = %entity, error = %e, "Cannot open a page");
                return Status::Unknown;
            }
        };

        match self.classify(&html) {
            Ok(status) => {
                tracing::debug!(entity = %entity, status = %status, "Markup classified");
                status
            }
            Err(e) => {
                tracing::warn!(client = %client, entity = %entity, error = %e, "Unknown status");
                Status::Unknown
            }
        }
    }
}
