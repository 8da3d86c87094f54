//! Status transition engine.
//!
//! # State Transitions
//! ```text
//! (no record) ──first classification──▶ Online | Offline | Denied
//! Online | Offline | Denied ──observation──▶ Online | Offline | Denied
//! any ──NotFound (streak <= threshold)──▶ stored as Offline, streak + 1
//! any ──NotFound (streak > threshold)──▶ removed
//! Unknown observations never touch state
//! ```

use crate::config::TransitionConfig;
use crate::model::{CheckResult, EntityId, Status, StatusRecord};
use crate::store::{StatusStore, StoreError};

/// What subscribers should hear about an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to report.
    Quiet,
    /// Subscribers should be told about the new status.
    Notify(Status),
    /// The entity is presumed permanently gone: unsubscribe everyone.
    Removed,
}

/// How the stored record changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Keep,
    Put(StatusRecord),
    Delete,
}

/// Outcome of applying one observation to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub change: RecordChange,
    pub transition: Transition,
}

/// Applies debounce and not-found rules to raw check results.
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    config: TransitionConfig,
}

impl TransitionEngine {
    pub fn new(config: TransitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Replace the rules, e.g. after a config reload.
    pub fn set_config(&mut self, config: TransitionConfig) {
        if config != self.config {
            tracing::info!(?config, "Transition rules updated");
        }
        self.config = config;
    }

    /// Decide what an observation does to the previous record.
    pub fn decide(&self, previous: Option<StatusRecord>, observed: Status, now: i64) -> Decision {
        match observed {
            Status::Unknown => Decision {
                change: RecordChange::Keep,
                transition: Transition::Quiet,
            },
            Status::NotFound => {
                let streak = previous.map_or(0, |r| r.not_found_streak) + 1;
                if streak > self.config.not_found_threshold {
                    Decision {
                        change: RecordChange::Delete,
                        transition: Transition::Removed,
                    }
                } else {
                    // a missing profile counts as offline until it is given up on
                    self.observe(previous, Status::Offline, streak, now)
                }
            }
            status => self.observe(previous, status, 0, now),
        }
    }

    fn observe(&self, previous: Option<StatusRecord>, status: Status, streak: u32, now: i64) -> Decision {
        let stored = previous.map_or(Status::Unknown, |r| r.status);
        let mut last_online = previous.map_or(0, |r| r.last_online);

        let offline_notifications = self.config.offline_notifications;
        let change_allowed = offline_notifications || status == Status::Online;
        let duration_allowed =
            offline_notifications || now - last_online >= self.config.offline_threshold_secs;
        let notify = stored != status && change_allowed && duration_allowed;

        if status == Status::Online {
            last_online = now;
        }

        Decision {
            change: RecordChange::Put(StatusRecord {
                status,
                not_found_streak: streak,
                last_online,
            }),
            transition: if notify {
                Transition::Notify(status)
            } else {
                Transition::Quiet
            },
        }
    }

    /// Apply a check result against the store and persist the outcome.
    pub async fn apply(&self, store: &dyn StatusStore, result: &CheckResult) -> Result<Transition, StoreError> {
        if result.status == Status::Unknown {
            return Ok(Transition::Quiet);
        }

        let previous = store.get_status_record(&result.entity).await?;
        let decision = self.decide(previous, result.status, result.observed_at);
        self.persist(store, &result.entity, decision.change).await?;

        tracing::trace!(entity = %result.entity, observed = %result.status, ?decision, "Transition decided");
        Ok(decision.transition)
    }

    async fn persist(&self, store: &dyn StatusStore, entity: &EntityId, change: RecordChange) -> Result<(), StoreError> {
        match change {
            RecordChange::Keep => Ok(()),
            RecordChange::Put(record) => store.put_status_record(entity, record).await,
            RecordChange::Delete => store.delete_status_record(entity).await,
        }
    }
}
