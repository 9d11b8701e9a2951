//! # Splice Telemetry
//!
//! Observability for the Splice storefront.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, pretty or JSON output.
//! - **Traces**: OpenTelemetry OTLP export when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! - **Metrics**: Prometheus registry, exposed by the storefront on `/metrics`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use splice_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).await?;
//!     // ...
//!     Ok(())
//! }
//! ```

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, DOWNLOADS, FULFILLED_CENTS, HTTP_REQUESTS,
    HTTP_REQUEST_DURATION, NEXT_BLOCK, ORDERS_CREATED, PAYMENT_EVENTS, POLL_FAILURES,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global subscriber.
///
/// Hold the returned guard for the lifetime of the process; dropping it
/// flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config).await?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shut down.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
