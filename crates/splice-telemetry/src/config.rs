//! Telemetry configuration from environment variables.

use std::env;

/// Logging and tracing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to traces.
    pub service_name: String,

    /// `EnvFilter` directive (e.g. `info`, `splice=debug,tower_http=warn`).
    pub log_level: String,

    /// Emit JSON lines instead of pretty console output.
    pub json_logs: bool,

    /// OTLP collector endpoint. Traces are exported only when set.
    pub otlp_endpoint: Option<String>,

    /// Deployment environment tag (e.g. `dev`, `prod`).
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "splice".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            otlp_endpoint: None,
            environment: "dev".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Read from the process environment.
    ///
    /// - `OTEL_SERVICE_NAME` (default `splice`)
    /// - `SPLICE_LOG_LEVEL` or `RUST_LOG` (default `info`)
    /// - `SPLICE_JSON_LOGS` (default `false`, `true` inside containers)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT` (unset disables export)
    /// - `SPLICE_ENVIRONMENT` (default `dev`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| "splice".to_string()),

            log_level: lookup("SPLICE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            json_logs: lookup("SPLICE_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(is_container),

            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),

            environment: lookup("SPLICE_ENVIRONMENT").unwrap_or_else(|| "dev".to_string()),
        }
    }
}
