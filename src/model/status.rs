//! Presence statuses and the records derived from them.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::model::EntityId;

/// Classification of an entity's presence.
///
/// `Unknown` means "classification failed this round" and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Unknown,
    Online,
    Offline,
    Denied,
    NotFound,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Online => "online",
            Status::Offline => "offline",
            Status::Denied => "denied",
            Status::NotFound => "not_found",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted per-entity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Last stored status (never `Unknown` or `NotFound`).
    pub status: Status,
    /// Consecutive rounds the entity was reported as not found.
    pub not_found_streak: u32,
    /// Unix seconds of the latest observation as `Online`, 0 if never seen online.
    pub last_online: i64,
}

/// One entity's classification for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub entity: EntityId,
    pub status: Status,
    /// Unix seconds.
    pub observed_at: i64,
    pub image: Option<String>,
}

/// Current time in unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
