//! Check protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler consumer (one client per round)
//!     → Checker::check_batch(client, entities)
//!         - roster.rs: one GET per roster endpoint, names listed are online
//!         - redirect.rs: one GET per entity, status code decides
//!         - markup.rs: one rendered page per entity, markers decide
//!     → BatchOutcome (statuses + thumbnails) or CheckError
//! ```
//!
//! # Design Decisions
//! - One implementation per service behind a single trait, no service-name branching
//! - Per-entity checks never fail a round; they degrade that entity to Unknown
//! - Roster failures fail the whole round; the caller turns it into all-Unknown
//! - Every identifier leaving a checker is already canonical

pub mod markup;
pub mod redirect;
pub mod roster;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::client_pool::ClientDescriptor;
use crate::config::CheckerConfig;
use crate::model::{EntityId, Status};

pub use markup::{MarkupChecker, PageRenderer, PrerenderService};
pub use redirect::RedirectChecker;
pub use roster::RosterChecker;

/// Reasons a check could not classify its targets.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Connection, timeout or body read failure.
    #[error("cannot send a query: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with something other than 200.
    #[error("query status {0}")]
    UnexpectedStatus(u16),

    /// Malformed payload.
    #[error("cannot parse response: {0}")]
    Decode(String),

    /// A successful but empty roster; never means "everyone is offline".
    #[error("zero online models reported")]
    ZeroResults,

    /// Page render did not resolve in time.
    #[error("check timed out after {0} seconds")]
    RenderTimeout(u64),

    /// Page rendered but no classification rule matched.
    #[error("unrecognized markup, status classes {0:?}")]
    UnrecognizedMarkup(Vec<String>),
}

/// Result of one batch check.
///
/// Roster checkers only list entities they saw; absent entities are offline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub statuses: HashMap<EntityId, Status>,
    pub images: HashMap<EntityId, String>,
}

/// Per-service classification protocol.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Canonicalize user input (bare id or profile URL) for this service.
    fn canonical_id(&self, input: &str) -> EntityId {
        EntityId::from_input(input)
    }

    /// Classify a single entity.
    async fn check_single(&self, client: &ClientDescriptor, entity: &EntityId) -> Status;

    /// Classify many entities in one round.
    ///
    /// The default checks each entity in turn through the same client.
    async fn check_batch(
        &self,
        client: &ClientDescriptor,
        entities: &[EntityId],
    ) -> Result<BatchOutcome, CheckError> {
        let mut outcome = BatchOutcome::default();
        for entity in entities {
            let status = self.check_single(client, entity).await;
            outcome.statuses.insert(entity.clone(), status);
        }
        Ok(outcome)
    }
}

/// Build the checker selected by configuration.
pub fn build_checker(config: &CheckerConfig, verbose: bool) -> Arc<dyn Checker> {
    match config {
        CheckerConfig::Roster(roster) => Arc::new(RosterChecker::new(roster.clone(), verbose)),
        CheckerConfig::Redirect(redirect) => {
            let mut checker = RedirectChecker::new(redirect.profile_url.clone());
            if let Some(field) = &redirect.status_field {
                checker = checker.with_status_field(field.clone(), verbose);
            }
            Arc::new(checker)
        }
        CheckerConfig::Markup(markup) => {
            let renderer = Arc::new(PrerenderService::new(
                markup.renderer_url.clone(),
                Duration::from_secs(markup.timeout_secs),
            ));
            Arc::new(MarkupChecker::new(markup.clone(), renderer))
        }
    }
}

/// Substitute the entity id into a profile URL template.
pub(crate) fn profile_url(template: &str, entity: &EntityId) -> String {
    template.replace("{id}", entity.as_str())
}
