//! Prometheus metrics for Splice.
//!
//! All metrics follow the naming convention `splice_<component>_<metric>`.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RECONCILER
    // =========================================================================

    /// Chain payment events by outcome (fulfilled, replay, insufficient_amount, ...)
    pub static ref PAYMENT_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("splice_reconciler_events_total", "Chain payment events processed"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Fiat value of fulfilling payments
    pub static ref FULFILLED_CENTS: IntCounter = IntCounter::new(
        "splice_reconciler_fulfilled_cents_total",
        "Sum of paid value of fulfilled payment requests, in cents"
    ).expect("metric creation failed");

    // =========================================================================
    // SUBSCRIPTION
    // =========================================================================

    pub static ref NEXT_BLOCK: IntGauge = IntGauge::new(
        "splice_subscription_next_block",
        "Next chain block the subscription will process"
    ).expect("metric creation failed");

    pub static ref POLL_FAILURES: IntCounter = IntCounter::new(
        "splice_subscription_poll_failures_total",
        "Failed chain polls (provider or store unavailable)"
    ).expect("metric creation failed");

    // =========================================================================
    // STOREFRONT
    // =========================================================================

    pub static ref ORDERS_CREATED: IntCounter = IntCounter::new(
        "splice_orders_created_total",
        "Payment requests created"
    ).expect("metric creation failed");

    /// Download attempts by outcome (served, unauthorized, not_paid, ...)
    pub static ref DOWNLOADS: IntCounterVec = IntCounterVec::new(
        Opts::new("splice_downloads_total", "Download attempts"),
        &["outcome"]
    ).expect("metric creation failed");

    pub static ref HTTP_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("splice_http_requests_total", "HTTP requests by method and status"),
        &["method", "status"]
    ).expect("metric creation failed");

    pub static ref HTTP_REQUEST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "splice_http_request_duration_seconds",
            "HTTP request latency"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
    ).expect("metric creation failed");
}

/// Register every metric with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(PAYMENT_EVENTS.clone()),
        Box::new(FULFILLED_CENTS.clone()),
        Box::new(NEXT_BLOCK.clone()),
        Box::new(POLL_FAILURES.clone()),
        Box::new(ORDERS_CREATED.clone()),
        Box::new(DOWNLOADS.clone()),
        Box::new(HTTP_REQUESTS.clone()),
        Box::new(HTTP_REQUEST_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
