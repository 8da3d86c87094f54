//! Per-service result processor.
//!
//! # Responsibilities
//! - Feed every result into the health window and metrics
//! - Run known results through the transition engine
//! - Dispatch notifications and handle permanent removal
//! - Raise error-rate alerts to the admin recipient

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{HealthConfig, TransitionConfig};
use crate::health::HealthMonitor;
use crate::model::{CheckResult, EntityId, Status};
use crate::notify::Notifier;
use crate::observability::metrics;
use crate::scheduler::RoundEvent;
use crate::store::{StatusStore, Subscriber};
use crate::transition::{Transition, TransitionEngine};

pub struct Monitor {
    store: Arc<dyn StatusStore>,
    notifier: Arc<dyn Notifier>,
    engine: TransitionEngine,
    health: HealthMonitor,
    health_interval: Duration,
    admin: Option<Subscriber>,
}

impl Monitor {
    pub fn new(
        store: Arc<dyn StatusStore>,
        notifier: Arc<dyn Notifier>,
        transitions: TransitionConfig,
        health: &HealthConfig,
        admin: Option<Subscriber>,
    ) -> Self {
        Self {
            store,
            notifier,
            engine: TransitionEngine::new(transitions),
            health: HealthMonitor::new(health),
            health_interval: Duration::from_secs(health.check_interval_secs.max(1)),
            admin,
        }
    }

    /// Process scheduler events until the stream closes.
    ///
    /// The health window is evaluated on its own timer, and transition rules
    /// are swapped whenever `rule_updates` yields.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<RoundEvent>,
        mut rule_updates: mpsc::UnboundedReceiver<TransitionConfig>,
    ) {
        let mut health_tick = time::interval_at(Instant::now() + self.health_interval, self.health_interval);
        health_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(RoundEvent::Result(result)) => self.handle_result(&result).await,
                    Some(RoundEvent::Completed { entities, elapsed, failed }) => {
                        metrics::record_round(elapsed, failed);
                        tracing::debug!(entities, elapsed_ms = elapsed.as_millis() as u64, failed, "Round completed");
                    }
                    None => break,
                },
                _ = health_tick.tick() => self.check_health(Instant::now().into_std()).await,
                Some(rules) = rule_updates.recv() => self.engine.set_config(rules),
            }
        }
        tracing::info!("Result pipeline stopped");
    }

    /// Process one check result end to end.
    pub async fn handle_result(&mut self, result: &CheckResult) {
        let unknown = result.status == Status::Unknown;
        self.health.record(unknown);
        metrics::record_check_result(result.status);
        if unknown {
            return;
        }

        let subscribers = match self.store.subscribers(&result.entity).await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                tracing::error!(entity = %result.entity, error = %e, "Cannot query subscribers");
                return;
            }
        };
        if subscribers.is_empty() {
            tracing::debug!(entity = %result.entity, "No subscribers, ignoring result");
            return;
        }

        let transition = match self.engine.apply(self.store.as_ref(), result).await {
            Ok(transition) => transition,
            Err(e) => {
                tracing::error!(entity = %result.entity, error = %e, "Cannot update status record");
                return;
            }
        };

        match transition {
            Transition::Quiet => {}
            Transition::Notify(status) => {
                tracing::info!(entity = %result.entity, status = %status, subscribers = subscribers.len(), "Status changed");
                self.dispatch(&subscribers, &result.entity, status).await;
            }
            Transition::Removed => {
                tracing::info!(entity = %result.entity, subscribers = subscribers.len(), "Entity not found, removing subscriptions");
                self.dispatch(&subscribers, &result.entity, Status::NotFound).await;
                if let Err(e) = self.store.remove_subscriptions(&result.entity).await {
                    tracing::error!(entity = %result.entity, error = %e, "Cannot remove subscriptions");
                }
            }
        }
    }

    async fn dispatch(&self, subscribers: &[Subscriber], entity: &EntityId, status: Status) {
        for subscriber in subscribers {
            match self.notifier.notify(subscriber, entity, status).await {
                Ok(()) => metrics::record_notification(status),
                Err(e) => tracing::warn!(
                    endpoint = %subscriber.endpoint,
                    subscriber = %subscriber.id,
                    entity = %entity,
                    error = %e,
                    "Notification delivery failed"
                ),
            }
        }
    }

    /// Evaluate the error window and alert the admin if it is unhealthy.
    pub async fn check_health(&mut self, now: std::time::Instant) {
        let Some(alert) = self.health.evaluate(now) else {
            return;
        };
        let text = alert.to_string();
        tracing::warn!(unknowns = alert.unknowns, denominator = alert.denominator, "{}", text);

        let Some(admin) = &self.admin else {
            return;
        };
        if let Err(e) = self.notifier.alert(admin, &text).await {
            tracing::warn!(endpoint = %admin.endpoint, error = %e, "Alert delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::model::StatusRecord;
    use crate::notify::NotifyError;
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct RecordingNotifier {
        notifications: Mutex<Vec<(String, String, Status)>>,
        alerts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, subscriber: &Subscriber, entity: &EntityId, status: Status) -> Result<(), NotifyError> {
            self.notifications
                .lock()
                .unwrap()
                .push((subscriber.id.clone(), entity.to_string(), status));
            Ok(())
        }

        async fn alert(&self, _: &Subscriber, text: &str) -> Result<(), NotifyError> {
            self.alerts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn result(entity: &str, status: Status, observed_at: i64) -> CheckResult {
        CheckResult {
            entity: EntityId::new(entity),
            status,
            observed_at,
            image: None,
        }
    }

    fn monitor(store: &MemoryStore, notifier: &Arc<RecordingNotifier>, health: HealthConfig) -> Monitor {
        Monitor::new(
            Arc::new(store.clone()),
            notifier.clone(),
            TransitionConfig {
                offline_notifications: false,
                offline_threshold_secs: 600,
                not_found_threshold: 2,
            },
            &health,
            Some(Subscriber::new("main", "admin")),
        )
    }

    #[tokio::test]
    async fn test_online_notifies_every_subscriber() {
        let store = MemoryStore::new(None);
        store.subscribe(EntityId::new("e1"), Subscriber::new("main", "1"));
        store.subscribe(EntityId::new("e1"), Subscriber::new("main", "2"));
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor = monitor(&store, &notifier, HealthConfig::default());

        monitor.handle_result(&result("e1", Status::Online, 1000)).await;
        monitor.handle_result(&result("e1", Status::Online, 1005)).await;

        let sent = notifier.notifications.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, e, s)| e == "e1" && *s == Status::Online));
    }

    #[tokio::test]
    async fn test_unwatched_entity_is_ignored() {
        let store = MemoryStore::new(None);
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor = monitor(&store, &notifier, HealthConfig::default());

        monitor.handle_result(&result("ghost", Status::Online, 1000)).await;

        assert!(notifier.notifications.lock().unwrap().is_empty());
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_leaves_record_untouched() {
        let store = MemoryStore::new(None);
        let entity = EntityId::new("e1");
        store.subscribe(entity.clone(), Subscriber::new("main", "1"));
        let record = StatusRecord {
            status: Status::Online,
            not_found_streak: 0,
            last_online: 900,
        };
        store.put_status_record(&entity, record).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor = monitor(&store, &notifier, HealthConfig::default());

        monitor.handle_result(&result("e1", Status::Unknown, 1000)).await;

        assert_eq!(store.get_status_record(&entity).await.unwrap(), Some(record));
        assert!(notifier.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_streak_removes_subscriptions() {
        let store = MemoryStore::new(None);
        let entity = EntityId::new("gone");
        store.subscribe(entity.clone(), Subscriber::new("main", "1"));
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor = monitor(&store, &notifier, HealthConfig::default());

        for round in 0..3 {
            monitor.handle_result(&result("gone", Status::NotFound, 1000 + round)).await;
        }

        let sent = notifier.notifications.lock().unwrap().clone();
        assert_eq!(sent, vec![("1".to_string(), "gone".to_string(), Status::NotFound)]);
        assert!(store.subscribers(&entity).await.unwrap().is_empty());
        assert!(store.get_status_record(&entity).await.unwrap().is_none());

        // no longer watched: later results are ignored
        monitor.handle_result(&result("gone", Status::NotFound, 2000)).await;
        assert_eq!(notifier.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_rate_alert_reaches_admin_once() {
        let store = MemoryStore::new(None);
        let notifier = Arc::new(RecordingNotifier::default());
        let health = HealthConfig {
            error_denominator: 10,
            error_threshold: 5,
            reporting_period_minutes: 10,
            check_interval_secs: 60,
        };
        let mut monitor = monitor(&store, &notifier, health);

        for i in 0..10 {
            let status = if i < 4 { Status::Offline } else { Status::Unknown };
            monitor.handle_result(&result("e1", status, 1000)).await;
        }

        let now = std::time::Instant::now();
        monitor.check_health(now).await;
        monitor.check_health(now + Duration::from_secs(60)).await;

        let alerts = notifier.alerts.lock().unwrap().clone();
        assert_eq!(alerts, vec!["Dangerous error rate reached: 6/10".to_string()]);
    }

    #[tokio::test]
    async fn test_run_stops_when_events_close() {
        let store = MemoryStore::new(None);
        store.subscribe(EntityId::new("e1"), Subscriber::new("main", "1"));
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor(&store, &notifier, HealthConfig::default());

        let (events_tx, events_rx) = mpsc::channel(8);
        let (_rules_tx, rules_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(monitor.run(events_rx, rules_rx));

        events_tx.send(RoundEvent::Result(result("e1", Status::Online, 1000))).await.unwrap();
        events_tx
            .send(RoundEvent::Completed {
                entities: 1,
                elapsed: Duration::from_millis(5),
                failed: false,
            })
            .await
            .unwrap();
        drop(events_tx);
        task.await.unwrap();

        assert_eq!(notifier.notifications.lock().unwrap().len(), 1);
    }
}
