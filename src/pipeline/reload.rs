//! Splits validated config reloads into per-component updates.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{MonitorConfig, TransitionConfig};

/// Receivers for the settings that can change without a restart.
pub struct ReloadChannels {
    pub poll_period: mpsc::UnboundedReceiver<Duration>,
    pub transitions: mpsc::UnboundedReceiver<TransitionConfig>,
    pub task: JoinHandle<()>,
}

/// Forward each reloaded config's poll interval and transition rules.
///
/// Other sections (checker, clients, store) take effect on restart only.
pub fn fan_out_config(mut updates: mpsc::UnboundedReceiver<MonitorConfig>) -> ReloadChannels {
    let (period_tx, period_rx) = mpsc::unbounded_channel();
    let (transitions_tx, transitions_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            tracing::info!(
                period_secs = config.polling.period_secs,
                offline_notifications = config.transitions.offline_notifications,
                "Applying reloaded configuration"
            );
            let period_sent = period_tx
                .send(Duration::from_secs(config.polling.period_secs))
                .is_ok();
            let rules_sent = transitions_tx.send(config.transitions).is_ok();
            if !period_sent && !rules_sent {
                break;
            }
        }
    });

    ReloadChannels {
        poll_period: period_rx,
        transitions: transitions_rx,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reload_reaches_both_components() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = fan_out_config(rx);

        let mut config = MonitorConfig::default();
        config.polling.period_secs = 30;
        config.transitions.offline_notifications = true;
        tx.send(config).unwrap();

        assert_eq!(channels.poll_period.recv().await, Some(Duration::from_secs(30)));
        let rules = channels.transitions.recv().await.unwrap();
        assert!(rules.offline_notifications);

        drop(tx);
        channels.task.await.unwrap();
    }
}
