// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the IONOS webhook.
//!
//! All metrics share the namespace prefix `ionos_webhook_` and are served by the
//! exposed server on `/metrics`.
//!
//! # Metrics Categories
//!
//! - **Remote API Metrics** - Track calls to the IONOS DNS API and their outcomes
//! - **Record Metrics** - Track records created and deleted
//! - **Zone Metrics** - Track zone directory reloads
//! - **Performance Metrics** - Track apply-changes duration
//!
//! # Example
//!
//! ```rust,no_run
//! use ionos_webhook::metrics::record_api_request;
//!
//! // Record a successful remote call
//! record_api_request("list zones", "success");
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all webhook metrics
const METRICS_NAMESPACE: &str = "ionos_webhook";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Remote API Metrics
// ============================================================================

/// Total number of remote DNS API requests by operation and outcome
///
/// Labels:
/// - `operation`: API call (e.g., `list zones`, `create record`)
/// - `outcome`: `success`, or the error status reason (e.g., `ZoneNotFound`)
pub static API_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_api_requests_total"),
        "Total number of remote DNS API requests by operation and outcome",
    );
    let counter = CounterVec::new(opts, &["operation", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Record Metrics
// ============================================================================

/// Total number of record changes by action and mode
///
/// Labels:
/// - `action`: `create` or `delete`
/// - `mode`: `applied` or `dry_run`
pub static RECORD_CHANGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_record_changes_total"),
        "Total number of record changes by action and mode",
    );
    let counter = CounterVec::new(opts, &["action", "mode"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Zone Metrics
// ============================================================================

/// Total number of zone directory reloads by outcome
///
/// Labels:
/// - `outcome`: `success` or `error`
pub static ZONE_RELOADS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_zone_reloads_total"),
        "Total number of zone directory reloads by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Performance Metrics
// ============================================================================

/// Duration of apply-changes passes in seconds
///
/// Labels:
/// - `outcome`: `success` or `error`
pub static APPLY_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_apply_duration_seconds"),
        "Duration of apply-changes passes in seconds by outcome",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record one remote API request
///
/// # Arguments
/// * `operation` - The API call made (e.g., `list zones`)
/// * `outcome` - `success` or an error status reason
pub fn record_api_request(operation: &str, outcome: &str) {
    API_REQUESTS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Record one record created or deleted
///
/// # Arguments
/// * `action` - `create` or `delete`
/// * `dry_run` - Whether the change was only logged
pub fn record_change(action: &str, dry_run: bool) {
    let mode = if dry_run { "dry_run" } else { "applied" };
    RECORD_CHANGES_TOTAL.with_label_values(&[action, mode]).inc();
}

/// Record a zone directory reload
pub fn record_zone_reload(success: bool) {
    let outcome = if success { "success" } else { "error" };
    ZONE_RELOADS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record the duration of one apply-changes pass
pub fn record_apply_duration(duration: Duration, success: bool) {
    let outcome = if success { "success" } else { "error" };
    APPLY_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
