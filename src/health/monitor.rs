//! Error-rate alerting.
//!
//! # Responsibilities
//! - Record one sample per check result
//! - Periodically compare the unknown count with the threshold
//! - Rate-limit alerts with a cooldown
//!
//! # Design Decisions
//! - Owned by the pipeline loop that writes it, so no locking
//! - One instance per monitored service, never global
//! - The first breach alerts immediately; later ones wait for the cooldown

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::HealthConfig;
use crate::health::window::ErrorWindow;
use crate::observability::metrics;

/// Raised when too many recent results could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthAlert {
    pub unknowns: usize,
    pub denominator: usize,
}

impl fmt::Display for HealthAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dangerous error rate reached: {}/{}", self.unknowns, self.denominator)
    }
}

pub struct HealthMonitor {
    window: ErrorWindow,
    threshold: usize,
    period: Duration,
    next_report: Option<Instant>,
}

impl HealthMonitor {
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            window: ErrorWindow::new(config.error_denominator),
            threshold: config.error_threshold,
            period: Duration::from_secs(config.reporting_period_minutes * 60),
            next_report: None,
        }
    }

    /// Record one check result.
    pub fn record(&mut self, unknown: bool) {
        self.window.record(unknown);
    }

    pub fn unknowns(&self) -> usize {
        self.window.unknowns()
    }

    /// Evaluate the window; returns an alert at most once per cooldown period.
    pub fn evaluate(&mut self, now: Instant) -> Option<HealthAlert> {
        let unknowns = self.window.unknowns();
        metrics::record_error_window(unknowns);

        if unknowns <= self.threshold {
            return None;
        }
        if self.next_report.is_some_and(|next| now < next) {
            tracing::debug!(unknowns, "Error rate still high, alert cooling down");
            return None;
        }

        self.next_report = Some(now + self.period);
        Some(HealthAlert {
            unknowns,
            denominator: self.window.denominator(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(denominator: usize, threshold: usize) -> HealthMonitor {
        HealthMonitor::new(&HealthConfig {
            error_denominator: denominator,
            error_threshold: threshold,
            reporting_period_minutes: 10,
            check_interval_secs: 60,
        })
    }

    #[test]
    fn test_single_alert_within_cooldown() {
        let mut health = monitor(10, 5);
        let start = Instant::now();

        for _ in 0..4 {
            health.record(false);
        }
        for _ in 0..5 {
            health.record(true);
        }
        assert_eq!(health.evaluate(start), None);

        health.record(true);
        let alert = health.evaluate(start).unwrap();
        assert_eq!(alert, HealthAlert { unknowns: 6, denominator: 10 });
        assert_eq!(alert.to_string(), "Dangerous error rate reached: 6/10");

        health.record(true);
        assert_eq!(health.unknowns(), 7);
        assert_eq!(health.evaluate(start + Duration::from_secs(60)), None);

        let after_cooldown = health.evaluate(start + Duration::from_secs(601)).unwrap();
        assert_eq!(after_cooldown.unknowns, 7);
    }

    #[test]
    fn test_recovered_window_stays_quiet() {
        let mut health = monitor(4, 1);
        let now = Instant::now();
        health.record(true);
        health.record(true);
        assert!(health.evaluate(now).is_some());

        for _ in 0..4 {
            health.record(false);
        }
        assert_eq!(health.evaluate(now + Duration::from_secs(3600)), None);
    }
}
