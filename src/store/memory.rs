//! In-memory store with JSON snapshot persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::model::{EntityId, StatusRecord};
use crate::store::{StatusStore, StoreError, Subscriber, WatchList};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    subscriptions: BTreeMap<EntityId, BTreeSet<Subscriber>>,
    records: BTreeMap<EntityId, StatusRecord>,
}

/// A thread-safe store for subscriptions and status records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    subscriptions: Arc<DashMap<EntityId, BTreeSet<Subscriber>>>,
    records: Arc<DashMap<EntityId, StatusRecord>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(snapshot_path: Option<PathBuf>) -> Self {
        Self {
            snapshot_path,
            ..Self::default()
        }
    }

    /// Load from the snapshot file if it exists.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;

            for (entity, subscribers) in snapshot.subscriptions {
                store.subscriptions.insert(entity, subscribers);
            }
            for (entity, record) in snapshot.records {
                store.records.insert(entity, record);
            }
            tracing::info!(
                entities = store.subscriptions.len(),
                records = store.records.len(),
                "Loaded store snapshot"
            );
        }
        Ok(store)
    }

    /// Save to the snapshot file, if one is configured.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let snapshot = Snapshot {
            subscriptions: self
                .subscriptions
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect(),
            records: self.records.iter().map(|r| (r.key().clone(), *r.value())).collect(),
        };

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        tracing::info!(path = %path.display(), records = snapshot.records.len(), "Saved store snapshot");
        Ok(())
    }

    /// Subscribe; returns false if the subscription already existed.
    pub fn subscribe(&self, entity: EntityId, subscriber: Subscriber) -> bool {
        self.subscriptions.entry(entity).or_default().insert(subscriber)
    }

    /// Unsubscribe; the status record goes away with the last subscriber.
    pub fn unsubscribe(&self, entity: &EntityId, subscriber: &Subscriber) -> bool {
        let removed = self
            .subscriptions
            .get_mut(entity)
            .map(|mut subscribers| subscribers.remove(subscriber))
            .unwrap_or(false);

        let now_unwatched = self
            .subscriptions
            .remove_if(entity, |_, subscribers| subscribers.is_empty())
            .is_some();
        if now_unwatched {
            self.records.remove(entity);
        }
        removed
    }

    /// Number of status records held.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of entities with at least one subscriber.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn get_status_record(&self, entity: &EntityId) -> Result<Option<StatusRecord>, StoreError> {
        Ok(self.records.get(entity).map(|r| *r.value()))
    }

    async fn put_status_record(&self, entity: &EntityId, record: StatusRecord) -> Result<(), StoreError> {
        self.records.insert(entity.clone(), record);
        Ok(())
    }

    async fn delete_status_record(&self, entity: &EntityId) -> Result<(), StoreError> {
        self.records.remove(entity);
        Ok(())
    }

    async fn subscribers(&self, entity: &EntityId) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self
            .subscriptions
            .get(entity)
            .map(|r| r.value().iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove_subscriptions(&self, entity: &EntityId) -> Result<(), StoreError> {
        self.subscriptions.remove(entity);
        Ok(())
    }
}

#[async_trait]
impl WatchList for MemoryStore {
    async fn watched_entities(&self) -> Result<Vec<EntityId>, StoreError> {
        let mut entities: Vec<EntityId> = self
            .subscriptions
            .iter()
            .filter(|r| !r.value().is_empty())
            .map(|r| r.key().clone())
            .collect();
        entities.sort();
        Ok(entities)
    }
}
