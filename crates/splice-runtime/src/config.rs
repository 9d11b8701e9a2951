//! # Runtime Configuration
//!
//! Defaults overridden by environment variables, validated before start.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SPLICE_API_CONFIG` | unset; JSON file with the HTTP settings |
//! | `SPLICE_HTTP_HOST` | `0.0.0.0` |
//! | `SPLICE_HTTP_PORT` (or `PORT`) | `3000` |
//! | `SPLICE_PROVIDER_RPC` | unset; chain subscription disabled. Requires `SPLICE_DATA_DIR` |
//! | `SPLICE_PAYMENT_RECEIVER_CONTRACT` | required with a provider |
//! | `SPLICE_STABLECOINS` | empty; `addr` or `addr:decimals`, comma separated |
//! | `SPLICE_START_BLOCK` | `0` |
//! | `SPLICE_NATIVE_USD_CENTS` | `220000` |
//! | `SPLICE_POLL_INTERVAL_SECS` | `3` |
//! | `SPLICE_MAX_BLOCK_RANGE` | `2000` |
//! | `SPLICE_DATA_DIR` | unset; in-memory store. Requires the `rocksdb` feature |
//! | `SPLICE_CONTENT_DIR` | `./content` |
//! | `SPLICE_NONCE_RETENTION_SECS` | `86400`; `0` disables replay protection |
//! | `SPLICE_SEED_CATALOG` | `true` |

use shared_types::Address;
use sp_02_payment_reconciler::{
    ConfigError as ReconcilerConfigError, ReconcilerConfig, SubscriptionConfig,
    DEFAULT_NATIVE_CENTS_PER_UNIT, DEFAULT_TOKEN_DECIMALS,
};
use sp_04_storefront_api::{ApiConfig, ConfigError as ApiConfigError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: invalid value {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot read API config {path}: {reason}")]
    ApiFile { path: String, reason: String },

    #[error("SPLICE_PAYMENT_RECEIVER_CONTRACT is required when SPLICE_PROVIDER_RPC is set")]
    MissingReceiver,

    #[error("SPLICE_NATIVE_USD_CENTS must be greater than zero")]
    ZeroRate,

    /// Request ids and the chain cursor would restart from zero while the
    /// chain still carries payments for the old ids.
    #[error("SPLICE_PROVIDER_RPC requires a durable store; set SPLICE_DATA_DIR")]
    VolatileStore,

    #[error("SPLICE_DATA_DIR is set but this build has no rocksdb feature")]
    StorageUnavailable,

    #[error(transparent)]
    Reconciler(#[from] ReconcilerConfigError),

    #[error(transparent)]
    Api(#[from] ApiConfigError),
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct SpliceConfig {
    pub api: ApiConfig,
    /// JSON-RPC endpoint. `None` runs the storefront without reconciliation.
    pub provider_rpc: Option<String>,
    pub receiver_contract: Option<Address>,
    pub reconciler: ReconcilerConfig,
    /// Native coin price in cents.
    pub native_cents_per_unit: u64,
    pub subscription: SubscriptionConfig,
    /// RocksDB directory. Requires the `rocksdb` feature.
    pub data_dir: Option<PathBuf>,
    pub content_dir: PathBuf,
    /// Nonce replay window. Zero disables the registry.
    pub nonce_retention: Duration,
    pub seed_catalog: bool,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            provider_rpc: None,
            receiver_contract: None,
            reconciler: ReconcilerConfig::default(),
            native_cents_per_unit: DEFAULT_NATIVE_CENTS_PER_UNIT,
            subscription: SubscriptionConfig::default(),
            data_dir: None,
            content_dir: PathBuf::from("./content"),
            nonce_retention: Duration::from_secs(24 * 60 * 60),
            seed_catalog: true,
        }
    }
}

fn parse_var<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true or false".into(),
        }),
    }
}

/// `addr` or `addr:decimals`, comma separated.
fn parse_stablecoins(value: &str) -> Result<Vec<(Address, u8)>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: "SPLICE_STABLECOINS",
        value: value.to_string(),
        reason,
    };

    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (addr, decimals) = match entry.split_once(':') {
                Some((addr, decimals)) => (
                    addr,
                    decimals
                        .trim()
                        .parse::<u8>()
                        .map_err(|e| invalid(format!("{entry}: {e}")))?,
                ),
                None => (entry, DEFAULT_TOKEN_DECIMALS),
            };
            let token = Address::parse(addr.trim()).map_err(|e| invalid(format!("{entry}: {e}")))?;
            Ok((token, decimals))
        })
        .collect()
}

fn load_api_file(path: &str) -> Result<ApiConfig, ConfigError> {
    let failed = |reason: String| ConfigError::ApiFile {
        path: path.to_string(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| failed(e.to_string()))
}

impl SpliceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = SpliceConfig::default();

        if let Some(path) = get("SPLICE_API_CONFIG") {
            config.api = load_api_file(path.trim())?;
        }
        if let Some(host) = get("SPLICE_HTTP_HOST") {
            config.api.host = parse_var("SPLICE_HTTP_HOST", host)?;
        }
        if let Some(port) = get("SPLICE_HTTP_PORT").or_else(|| get("PORT")) {
            config.api.port = parse_var("SPLICE_HTTP_PORT", port)?;
        }

        config.provider_rpc = get("SPLICE_PROVIDER_RPC").map(|v| v.trim().to_string());
        if let Some(receiver) = get("SPLICE_PAYMENT_RECEIVER_CONTRACT") {
            config.receiver_contract = Some(parse_var("SPLICE_PAYMENT_RECEIVER_CONTRACT", receiver)?);
        }
        if let Some(stablecoins) = get("SPLICE_STABLECOINS") {
            for (token, decimals) in parse_stablecoins(&stablecoins)? {
                config.reconciler = config.reconciler.with_stablecoin(token, decimals);
            }
        }
        if let Some(rate) = get("SPLICE_NATIVE_USD_CENTS") {
            config.native_cents_per_unit = parse_var("SPLICE_NATIVE_USD_CENTS", rate)?;
        }

        if let Some(start) = get("SPLICE_START_BLOCK") {
            config.subscription.start_block = parse_var("SPLICE_START_BLOCK", start)?;
        }
        if let Some(secs) = get("SPLICE_POLL_INTERVAL_SECS") {
            config.subscription.poll_interval =
                Duration::from_secs(parse_var("SPLICE_POLL_INTERVAL_SECS", secs)?);
        }
        if let Some(range) = get("SPLICE_MAX_BLOCK_RANGE") {
            config.subscription.max_block_range = parse_var("SPLICE_MAX_BLOCK_RANGE", range)?;
        }

        config.data_dir = get("SPLICE_DATA_DIR").map(|v| PathBuf::from(v.trim()));
        if let Some(dir) = get("SPLICE_CONTENT_DIR") {
            config.content_dir = PathBuf::from(dir.trim());
        }
        if let Some(secs) = get("SPLICE_NONCE_RETENTION_SECS") {
            config.nonce_retention =
                Duration::from_secs(parse_var("SPLICE_NONCE_RETENTION_SECS", secs)?);
        }
        if let Some(seed) = get("SPLICE_SEED_CATALOG") {
            config.seed_catalog = parse_bool("SPLICE_SEED_CATALOG", seed)?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.reconciler.validate()?;
        self.subscription.validate()?;
        if self.native_cents_per_unit == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if self.data_dir.is_some() && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::StorageUnavailable);
        }
        if self.provider_rpc.is_some() {
            if self.receiver_contract.is_none() {
                return Err(ConfigError::MissingReceiver);
            }
            if self.data_dir.is_none() {
                return Err(ConfigError::VolatileStore);
            }
        }
        Ok(())
    }
}
