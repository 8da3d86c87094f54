//! Canonical entity identifiers.
//!
//! Every identifier entering the core (user input, roster usernames, profile
//! URLs) goes through this module so that two spellings of the same entity
//! compare equal everywhere.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

static ENTITY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_\-@.]+$").expect("valid entity id regex"));

/// Errors produced when user input cannot be turned into an entity id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("empty entity id")]
    Empty,

    #[error("invalid symbols in entity id: {0}")]
    InvalidSymbols(String),
}

/// Canonical (lower-cased, URL-stripped) identifier of a watched entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Canonicalize a bare identifier, e.g. a username returned by a roster.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Canonicalize either a bare identifier or a full profile URL.
    ///
    /// `https://site.com/Name`, `site.com/Name/`, `site.com/Name?tab=1` and
    /// `NAME` all map to `name`.
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();
        match profile_segment(input) {
            Some(segment) => Self::new(&segment),
            None => Self::new(input),
        }
    }

    /// Canonicalize and validate user input.
    pub fn parse(input: &str) -> Result<Self, EntityIdError> {
        let id = Self::from_input(input);
        if id.0.is_empty() {
            return Err(EntityIdError::Empty);
        }
        if !ENTITY_ID_RE.is_match(&id.0) {
            return Err(EntityIdError::InvalidSymbols(id.0));
        }
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self::from_input(raw)
    }
}

/// Extract the first path segment of something that looks like a profile URL.
fn profile_segment(input: &str) -> Option<String> {
    let url = if input.contains("://") {
        Url::parse(input).ok()?
    } else {
        // "site.com/name": a host-looking prefix followed by a path
        let (host, _) = input.split_once('/')?;
        if !host.contains('.') {
            return None;
        }
        Url::parse(&format!("https://{}", input)).ok()?
    };

    url.path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}
