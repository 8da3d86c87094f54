//! Metrics collection and exposition.
//!
//! # Metrics
//! - `siren_check_results_total` (counter): classifications by status
//! - `siren_round_duration_seconds` (histogram): wall-clock time of a batch round
//! - `siren_round_errors_total` (counter): rounds degraded to all-unknown
//! - `siren_rounds_skipped_total` (counter): ticks skipped because a round was queued
//! - `siren_notifications_total` (counter): dispatched notifications by status
//! - `siren_error_window_unknowns` (gauge): unknown results in the health window

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::model::Status;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_check_result(status: Status) {
    metrics::counter!("siren_check_results_total", "status" => status.as_str()).increment(1);
}

pub fn record_round(elapsed: Duration, failed: bool) {
    metrics::histogram!("siren_round_duration_seconds").record(elapsed.as_secs_f64());
    if failed {
        metrics::counter!("siren_round_errors_total").increment(1);
    }
}

pub fn record_round_skipped() {
    metrics::counter!("siren_rounds_skipped_total").increment(1);
}

pub fn record_notification(status: Status) {
    metrics::counter!("siren_notifications_total", "status" => status.as_str()).increment(1);
}

pub fn record_error_window(unknowns: usize) {
    metrics::gauge!("siren_error_window_unknowns").set(unknowns as f64);
}
