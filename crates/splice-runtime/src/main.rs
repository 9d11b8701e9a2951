//! # Splice
//!
//! Storefront for digital books paid on-chain.
//!
//! ```text
//!  buyer ──HTTP──→ storefront ──→ payment store ←── reconciler ←── chain logs
//!                      │                                  ↑
//!                      └── signed download ───────────────┘ (fulfilled?)
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use splice_runtime::{SpliceConfig, SpliceRuntime, Stores};
use splice_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .await
        .context("Failed to initialize telemetry")?;

    let config = SpliceConfig::from_env().context("Failed to load configuration")?;
    let stores = Stores::open(&config)?;

    let runtime = SpliceRuntime::new(config, stores)?;
    let handle = runtime.start().await?;

    info!("Splice is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    handle.shutdown(SHUTDOWN_GRACE).await
}
