//! Status store and watch-list boundary.
//!
//! # Responsibilities
//! - Persist one `StatusRecord` per watched entity
//! - Answer "who is subscribed to this entity?" and "what is watched?"
//! - Drop subscriptions of entities presumed permanently gone
//!
//! # Design Decisions
//! - The core only sees the traits; `memory.rs` is the bundled implementation
//! - Methods are async so database-backed stores fit behind the same seam
//! - A record exists only while somebody watches the entity

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EntityId, StatusRecord};

pub use memory::MemoryStore;

/// Errors surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Someone receiving notifications about an entity on a delivery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Subscriber {
    /// Delivery endpoint (bot, webhook) the subscriber is reached through.
    pub endpoint: String,
    /// Subscriber identifier on that endpoint.
    pub id: String,
}

impl Subscriber {
    pub fn new(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            id: id.into(),
        }
    }
}

/// Persistent per-entity status state.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn get_status_record(&self, entity: &EntityId) -> Result<Option<StatusRecord>, StoreError>;

    async fn put_status_record(&self, entity: &EntityId, record: StatusRecord) -> Result<(), StoreError>;

    async fn delete_status_record(&self, entity: &EntityId) -> Result<(), StoreError>;

    /// Current subscribers of an entity.
    async fn subscribers(&self, entity: &EntityId) -> Result<Vec<Subscriber>, StoreError>;

    /// Unsubscribe everyone from an entity.
    async fn remove_subscriptions(&self, entity: &EntityId) -> Result<(), StoreError>;
}

/// Source of the entities needing a check each round.
#[async_trait]
pub trait WatchList: Send + Sync {
    async fn watched_entities(&self) -> Result<Vec<EntityId>, StoreError>;
}
