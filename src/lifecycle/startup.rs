//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems from a validated configuration
//! - Seed configured subscriptions into the store
//! - Start the config watcher, scheduler and pipeline
//! - Stop them in order and persist the store on shutdown

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::checker::build_checker;
use crate::client_pool::{ClientPool, ClientPoolError};
use crate::config::{ConfigWatcher, MonitorConfig, NotificationConfig, NotifierKind};
use crate::lifecycle::{wait_for_shutdown_signal, Shutdown};
use crate::model::EntityId;
use crate::notify::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
use crate::observability::metrics;
use crate::pipeline::{fan_out_config, Monitor};
use crate::scheduler::BatchScheduler;
use crate::store::{MemoryStore, StoreError, Subscriber};

/// Time allowed for the in-flight round and the pipeline to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("client pool: {0}")]
    ClientPool(#[from] ClientPoolError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("notifier: {0}")]
    Notifier(#[from] NotifyError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Handles of a started monitor.
pub struct RunningMonitor {
    store: MemoryStore,
    shutdown: Shutdown,
    producer: JoinHandle<()>,
    consumer: JoinHandle<()>,
    pipeline: JoinHandle<()>,
    // dropping the watcher stops reload notifications
    _watcher: Option<::notify::RecommendedWatcher>,
}

impl RunningMonitor {
    /// The store backing this monitor.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Stop ticking, let the current round and pipeline drain, then save.
    pub async fn shutdown(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        if let Err(e) = self.producer.await {
            tracing::error!(error = %e, "Scheduler producer task failed");
        }

        let drain = async {
            let _ = self.consumer.await;
            let _ = self.pipeline.await;
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            tracing::warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Shutdown deadline reached, abandoning in-flight round");
        }

        self.store.save_to_file()?;
        Ok(())
    }
}

/// Run the monitor until SIGINT/SIGTERM.
pub async fn run(config: MonitorConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    let monitor = start(config, config_path.as_deref()).await?;
    wait_for_shutdown_signal().await;
    monitor.shutdown().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Start every subsystem and return without waiting.
///
/// With `config_path`, changes to the file hot-reload the poll interval and
/// transition rules.
pub async fn start(config: MonitorConfig, config_path: Option<&Path>) -> Result<RunningMonitor, StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let store = build_store(&config)?;
    let notifier = build_notifier(&config.notifications)?;
    let pool = ClientPool::from_config(&config.clients)?;
    let checker = build_checker(&config.checker, config.observability.verbose);

    let (watcher, updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(guard) => (Some(guard), updates),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Config watcher unavailable, hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => (None, mpsc::unbounded_channel().1),
    };
    let reload = fan_out_config(updates);

    let shutdown = Shutdown::new();
    let scheduler = BatchScheduler::new(
        checker,
        pool,
        Arc::new(store.clone()),
        Duration::from_secs(config.polling.period_secs),
    );
    let handle = scheduler.spawn(reload.poll_period, shutdown.subscribe());

    let monitor = Monitor::new(
        Arc::new(store.clone()),
        notifier,
        config.transitions,
        &config.health,
        admin_recipient(&config.notifications),
    );
    let pipeline = tokio::spawn(monitor.run(handle.events, reload.transitions));

    tracing::info!(
        period_secs = config.polling.period_secs,
        watched = store.subscription_count(),
        "Monitor started"
    );

    Ok(RunningMonitor {
        store,
        shutdown,
        producer: handle.producer,
        consumer: handle.consumer,
        pipeline,
        _watcher: watcher,
    })
}

/// Open the store and add configured subscriptions.
pub fn build_store(config: &MonitorConfig) -> Result<MemoryStore, StoreError> {
    let store = match &config.store.snapshot_path {
        Some(path) => MemoryStore::load_from_file(Path::new(path))?,
        None => MemoryStore::new(None),
    };

    for subscription in &config.subscriptions {
        match EntityId::parse(&subscription.entity) {
            Ok(entity) => {
                store.subscribe(entity, Subscriber::new(&subscription.endpoint, &subscription.subscriber));
            }
            Err(e) => tracing::warn!(
                entity = %subscription.entity,
                error = %e,
                "Skipping configured subscription"
            ),
        }
    }
    Ok(store)
}

pub fn build_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    Ok(match config.sender {
        NotifierKind::Log => Arc::new(LogNotifier::new()),
        NotifierKind::Webhook => Arc::new(WebhookNotifier::new(
            config.webhooks.clone(),
            Duration::from_secs(config.timeout_secs),
        )?),
    })
}

fn admin_recipient(config: &NotificationConfig) -> Option<Subscriber> {
    match (&config.admin_endpoint, &config.admin_subscriber) {
        (Some(endpoint), Some(id)) => Some(Subscriber::new(endpoint, id)),
        _ => None,
    }
}
