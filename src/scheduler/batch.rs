//! Periodic batch scheduler.
//!
//! # Responsibilities
//! - Tick at the configured poll interval and fetch the watch-list
//! - Enqueue at most one pending round; skip ticks while one is queued
//! - Run each round through the checker with the next pooled client
//! - Emit one result per watched entity plus the round's duration

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::checker::{BatchOutcome, CheckError, Checker};
use crate::client_pool::ClientPool;
use crate::model::{unix_now, CheckResult, EntityId, Status};
use crate::observability::metrics;
use crate::store::WatchList;

/// Buffered events between the check consumer and the pipeline.
const EVENT_BUFFER: usize = 256;

/// Output of the scheduler, consumed one at a time by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// One entity's classification.
    Result(CheckResult),
    /// Emitted after a round's results, whether it succeeded or not.
    Completed {
        entities: usize,
        elapsed: Duration,
        failed: bool,
    },
}

/// Running scheduler tasks and their output.
pub struct SchedulerHandle {
    pub events: mpsc::Receiver<RoundEvent>,
    pub producer: JoinHandle<()>,
    pub consumer: JoinHandle<()>,
}

/// Drives one checker with one client pool.
pub struct BatchScheduler {
    checker: Arc<dyn Checker>,
    pool: ClientPool,
    watch_list: Arc<dyn WatchList>,
    period: Duration,
}

impl BatchScheduler {
    pub fn new(
        checker: Arc<dyn Checker>,
        pool: ClientPool,
        watch_list: Arc<dyn WatchList>,
        period: Duration,
    ) -> Self {
        Self {
            checker,
            pool,
            watch_list,
            period,
        }
    }

    /// Spawn the tick producer and the check consumer.
    ///
    /// `period_updates` changes the poll interval at runtime. Both tasks stop
    /// after `shutdown` fires; the consumer finishes its current round first.
    pub fn spawn(
        self,
        period_updates: mpsc::UnboundedReceiver<Duration>,
        shutdown: broadcast::Receiver<()>,
    ) -> SchedulerHandle {
        let (requests_tx, requests_rx) = mpsc::channel(1);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        tracing::info!(
            checker = self.checker.name(),
            clients = self.pool.len(),
            period_secs = self.period.as_secs(),
            "Batch scheduler starting"
        );

        let producer = tokio::spawn(produce(
            self.watch_list,
            requests_tx,
            self.period,
            period_updates,
            shutdown,
        ));
        let consumer = tokio::spawn(consume(self.checker, self.pool, requests_rx, events_tx));

        SchedulerHandle {
            events: events_rx,
            producer,
            consumer,
        }
    }
}

async fn produce(
    watch_list: Arc<dyn WatchList>,
    requests: mpsc::Sender<Vec<EntityId>>,
    mut period: Duration,
    mut period_updates: mpsc::UnboundedReceiver<Duration>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let entities = match watch_list.watched_entities().await {
                    Ok(entities) => entities,
                    Err(e) => {
                        tracing::error!(error = %e, "Cannot load the watch-list, skipping round");
                        continue;
                    }
                };
                match requests.try_send(entities) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::info!("The queue is full, skipping round");
                        metrics::record_round_skipped();
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            Some(new_period) = period_updates.recv() => {
                if new_period != period && !new_period.is_zero() {
                    tracing::info!(period_secs = new_period.as_secs(), "Poll interval updated");
                    period = new_period;
                    ticker = time::interval_at(time::Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Batch scheduler received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

async fn consume(
    checker: Arc<dyn Checker>,
    mut pool: ClientPool,
    mut requests: mpsc::Receiver<Vec<EntityId>>,
    events: mpsc::Sender<RoundEvent>,
) {
    while let Some(entities) = requests.recv().await {
        let client = pool.next();
        let started = Instant::now();
        let outcome = checker.check_batch(client, &entities).await;
        let elapsed = started.elapsed();

        let failed = match &outcome {
            Ok(_) => false,
            Err(e) => {
                tracing::error!(client = %client, checker = checker.name(), error = %e, "Batch check failed");
                true
            }
        };

        for result in round_results(&entities, outcome, unix_now()) {
            if events.send(RoundEvent::Result(result)).await.is_err() {
                return;
            }
        }
        let completed = RoundEvent::Completed {
            entities: entities.len(),
            elapsed,
            failed,
        };
        if events.send(completed).await.is_err() {
            return;
        }
    }
}

/// Turn a batch outcome into one result per watched entity.
///
/// Entities missing from a successful outcome are offline; a failed round
/// makes every entity unknown.
pub fn round_results(
    entities: &[EntityId],
    outcome: Result<BatchOutcome, CheckError>,
    observed_at: i64,
) -> Vec<CheckResult> {
    match outcome {
        Ok(mut outcome) => entities
            .iter()
            .map(|entity| CheckResult {
                entity: entity.clone(),
                status: outcome.statuses.get(entity).copied().unwrap_or(Status::Offline),
                observed_at,
                image: outcome.images.remove(entity),
            })
            .collect(),
        Err(_) => entities
            .iter()
            .map(|entity| CheckResult {
                entity: entity.clone(),
                status: Status::Unknown,
                observed_at,
                image: None,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::client_pool::ClientDescriptor;
    use crate::config::ClientsConfig;
    use crate::store::StoreError;

    fn ids(names: &[&str]) -> Vec<EntityId> {
        names.iter().map(|n| EntityId::new(n)).collect()
    }

    #[test]
    fn test_absent_entities_default_to_offline() {
        let mut outcome = BatchOutcome::default();
        outcome.statuses.insert(EntityId::new("e1"), Status::Online);
        outcome.images.insert(EntityId::new("e1"), "https://img/e1.jpg".into());

        let results = round_results(&ids(&["e1", "e2", "e3"]), Ok(outcome), 42);
        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Status::Online, Status::Offline, Status::Offline]);
        assert_eq!(results[0].image.as_deref(), Some("https://img/e1.jpg"));
        assert!(results.iter().all(|r| r.observed_at == 42));
    }

    #[test]
    fn test_failed_round_is_all_unknown() {
        let results = round_results(&ids(&["e1", "e2"]), Err(CheckError::ZeroResults), 42);
        assert!(results.iter().all(|r| r.status == Status::Unknown));
        assert_eq!(results.len(), 2);
    }

    struct FixedWatchList(Vec<EntityId>);

    #[async_trait]
    impl WatchList for FixedWatchList {
        async fn watched_entities(&self) -> Result<Vec<EntityId>, StoreError> {
            Ok(self.0.clone())
        }
    }

    /// Checker whose rounds take `delay`, counting how many rounds ran.
    struct SlowChecker {
        delay: Duration,
        rounds: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Checker for SlowChecker {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn check_single(&self, _: &ClientDescriptor, _: &EntityId) -> Status {
            Status::Online
        }

        async fn check_batch(&self, _: &ClientDescriptor, _: &[EntityId]) -> Result<BatchOutcome, CheckError> {
            self.rounds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Err(CheckError::ZeroResults)
        }
    }

    fn pool() -> ClientPool {
        ClientPool::from_config(&ClientsConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_emits_results_then_completion() {
        let rounds = Arc::new(AtomicUsize::new(0));
        let checker = Arc::new(SlowChecker {
            delay: Duration::ZERO,
            rounds: rounds.clone(),
        });
        let watch = Arc::new(FixedWatchList(ids(&["a", "b"])));
        let (_period_tx, period_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let mut handle = BatchScheduler::new(checker, pool(), watch, Duration::from_secs(3600))
            .spawn(period_rx, shutdown_rx);

        let mut events = Vec::new();
        for _ in 0..3 {
            events.push(handle.events.recv().await.unwrap());
        }
        assert!(matches!(&events[0], RoundEvent::Result(r) if r.status == Status::Unknown));
        assert!(matches!(&events[1], RoundEvent::Result(r) if r.entity.as_str() == "b"));
        assert!(matches!(events[2], RoundEvent::Completed { entities: 2, failed: true, .. }));

        let _ = shutdown_tx.send(());
        handle.producer.await.unwrap();
        handle.consumer.await.unwrap();
        assert_eq!(rounds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_period_update_changes_tick_rate() {
        let rounds = Arc::new(AtomicUsize::new(0));
        let checker = Arc::new(SlowChecker {
            delay: Duration::ZERO,
            rounds: rounds.clone(),
        });
        let watch = Arc::new(FixedWatchList(ids(&["a"])));
        let (period_tx, period_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let mut handle = BatchScheduler::new(checker, pool(), watch, Duration::from_secs(3600))
            .spawn(period_rx, shutdown_rx);

        // only the immediate first tick under the hourly period
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(rounds.load(Ordering::SeqCst), 1);

        period_tx.send(Duration::from_millis(50)).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(rounds.load(Ordering::SeqCst) >= 4, "rounds = {}", rounds.load(Ordering::SeqCst));

        let _ = shutdown_tx.send(());
        handle.producer.await.unwrap();
        while handle.events.recv().await.is_some() {}
        handle.consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_round_skips_ticks() {
        let rounds = Arc::new(AtomicUsize::new(0));
        let checker = Arc::new(SlowChecker {
            delay: Duration::from_millis(500),
            rounds: rounds.clone(),
        });
        let watch = Arc::new(FixedWatchList(ids(&["a"])));
        let (_period_tx, period_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let mut handle = BatchScheduler::new(checker, pool(), watch, Duration::from_millis(20))
            .spawn(period_rx, shutdown_rx);

        // ~25 ticks while the first round is in flight: one queued, the rest skipped
        tokio::time::sleep(Duration::from_millis(450)).await;
        let _ = shutdown_tx.send(());
        handle.producer.await.unwrap();

        let mut completed = 0;
        while let Some(event) = handle.events.recv().await {
            if matches!(event, RoundEvent::Completed { .. }) {
                completed += 1;
            }
        }
        handle.consumer.await.unwrap();
        assert_eq!(completed, 2);
        assert_eq!(rounds.load(Ordering::SeqCst), 2);
    }
}
