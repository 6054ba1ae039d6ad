//! Prometheus metrics for the forwarded header pipeline.
//!
//! Metrics are exposed on a dedicated listener when `METRICS_PORT > 0`.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `http_overrides_forwarded_total` - Resolved requests (label: outcome)
//! - `http_overrides_health_probes_total` - Answered probes (label: status)
//! - `http_overrides_host_rejections_total` - Requests rejected by host filtering
//!
//! ## Histograms
//! - `http_overrides_forwarded_hops` - Hops unwound per request
//!
//! Recording functions are no-ops until [`init_metrics`] installs the exporter,
//! so they are safe to call from tests.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

use crate::error::{AppError, AppResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const FORWARDED_TOTAL: &str = "http_overrides_forwarded_total";
    pub const HEALTH_PROBES_TOTAL: &str = "http_overrides_health_probes_total";
    pub const HOST_REJECTIONS_TOTAL: &str = "http_overrides_host_rejections_total";
    pub const FORWARDED_HOPS: &str = "http_overrides_forwarded_hops";
}

/// Initialize the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns `AppError::MetricsError` if the exporter cannot be installed
/// (for example when the port is already in use).
pub fn init_metrics(metrics_addr: SocketAddr) -> AppResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| AppError::MetricsError(format!("Failed to install Prometheus exporter: {e}")))?;

    describe_counter!(
        names::FORWARDED_TOTAL,
        "Total number of requests evaluated for forwarded headers"
    );
    describe_counter!(
        names::HEALTH_PROBES_TOTAL,
        "Total number of health probes answered"
    );
    describe_counter!(
        names::HOST_REJECTIONS_TOTAL,
        "Total number of requests rejected for a disallowed forwarded host"
    );
    describe_histogram!(
        names::FORWARDED_HOPS,
        "Number of proxy hops unwound per request"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record the outcome of one resolution.
pub fn record_forwarded(outcome: &'static str, hops: usize) {
    counter!(names::FORWARDED_TOTAL, "outcome" => outcome).increment(1);
    if hops > 0 {
        histogram!(names::FORWARDED_HOPS).record(hops as f64);
    }
}

/// Record an answered health probe.
pub fn record_health_probe(status: &'static str) {
    counter!(names::HEALTH_PROBES_TOTAL, "status" => status).increment(1);
}

/// Record a request rejected by host filtering.
pub fn record_host_rejection() {
    counter!(names::HOST_REJECTIONS_TOTAL).increment(1);
}
