//! # Splice Runtime
//!
//! Wires the store, reconciler, download authorizer and HTTP server together.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Open the store (RocksDB when `SPLICE_DATA_DIR` is set and the feature
//!    is enabled, memory otherwise)
//! 3. Seed the catalog if it is empty
//! 4. Bind and serve HTTP
//! 5. Start the chain subscription and its metrics handler (only with a provider)
//!
//! The chain subscription needs a durable store: request ids and the cursor
//! must survive a restart, or payments replayed from the chain would settle
//! newer requests that reuse the same ids.
//!
//! Every background task watches one shutdown channel.

use crate::config::{ConfigError, SpliceConfig};
use crate::handlers::PaymentEventHandler;
use crate::seed::{default_catalog, seed_if_empty};
use anyhow::{Context, Result};
use shared_types::Address;
use sp_01_payment_store::{CatalogRepository, CursorStore, InMemoryStore, PaymentRepository};
use sp_02_payment_reconciler::{
    FixedRateSource, JsonRpcEventSource, PaymentPricer, PaymentReconciler, SubscriptionDriver,
};
use sp_03_download_auth::{DownloadAuthorizer, FsContentProvider, NonceRegistry};
use sp_04_storefront_api::{AppState, OrderDesk, ServerError, StorefrontServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// The three repository ports, backed by one store.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub cursor: Arc<dyn CursorStore>,
    durable: bool,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            catalog: store.clone(),
            payments: store.clone(),
            cursor: store,
            durable: false,
        }
    }

    /// Whether ids and the chain cursor survive a restart.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Open the configured backend.
    pub fn open(config: &SpliceConfig) -> Result<Self> {
        match &config.data_dir {
            #[cfg(feature = "rocksdb")]
            Some(dir) => {
                use sp_01_payment_store::{RocksDbConfig, RocksDbStore};

                let path = dir.to_string_lossy().into_owned();
                let store = RocksDbStore::open(RocksDbConfig {
                    path: path.clone(),
                    ..RocksDbConfig::default()
                })
                .with_context(|| format!("Failed to open RocksDB at {path}"))?;
                info!(path = %path, "using RocksDB store");
                let store = Arc::new(store);
                Ok(Self {
                    catalog: store.clone(),
                    payments: store.clone(),
                    cursor: store,
                    durable: true,
                })
            }
            #[cfg(not(feature = "rocksdb"))]
            Some(dir) => Err(anyhow::Error::new(ConfigError::StorageUnavailable))
                .with_context(|| format!("Cannot open store at {}", dir.display())),
            None => {
                info!("using in-memory store");
                Ok(Self::in_memory())
            }
        }
    }
}

pub struct SpliceRuntime {
    config: SpliceConfig,
    stores: Stores,
    server: StorefrontServer,
    driver: Option<Arc<SubscriptionDriver>>,
}

impl SpliceRuntime {
    /// Build every component without starting anything.
    pub fn new(config: SpliceConfig, stores: Stores) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        if config.provider_rpc.is_some() && !stores.is_durable() {
            return Err(anyhow::Error::new(ConfigError::VolatileStore))
                .context("Invalid configuration");
        }

        let pricer = Arc::new(PaymentPricer::new(
            config.reconciler.clone(),
            Arc::new(FixedRateSource::new(config.native_cents_per_unit)),
        ));

        let receiver = config.receiver_contract.unwrap_or_else(|| {
            warn!("SPLICE_PAYMENT_RECEIVER_CONTRACT is not set; orders will name the zero address");
            Address::ZERO
        });

        let mut authorizer = DownloadAuthorizer::new(
            stores.catalog.clone(),
            stores.payments.clone(),
            Arc::new(FsContentProvider::new(&config.content_dir)),
        );
        if config.nonce_retention.is_zero() {
            warn!("nonce replay protection disabled");
        } else {
            authorizer = authorizer.with_nonce_registry(NonceRegistry::new(config.nonce_retention));
        }

        let state = AppState {
            catalog: stores.catalog.clone(),
            orders: Arc::new(OrderDesk::new(
                stores.catalog.clone(),
                stores.payments.clone(),
                pricer.clone(),
                receiver,
            )),
            downloads: Arc::new(authorizer),
        };
        let server = StorefrontServer::new(config.api.clone(), state)
            .context("Failed to build storefront server")?;

        let driver = config.provider_rpc.as_ref().map(|rpc| {
            let source = Arc::new(JsonRpcEventSource::new(rpc.clone(), receiver));
            let reconciler = Arc::new(PaymentReconciler::new(stores.payments.clone(), pricer.clone()));
            Arc::new(
                SubscriptionDriver::new(source, reconciler, config.subscription.clone())
                    .with_cursor_store(stores.cursor.clone()),
            )
        });

        Ok(Self {
            config,
            stores,
            server,
            driver,
        })
    }

    pub fn config(&self) -> &SpliceConfig {
        &self.config
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Seed, bind and spawn every task.
    pub async fn start(self) -> Result<RuntimeHandle> {
        info!("===========================================");
        info!("  Splice storefront v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        if self.config.seed_catalog {
            let seeded = seed_if_empty(self.stores.catalog.as_ref(), default_catalog())
                .await
                .context("Failed to seed catalog")?;
            if seeded > 0 {
                info!(items = seeded, "catalog seeded");
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        match &self.driver {
            Some(driver) => {
                let handler = PaymentEventHandler::new(driver.subscribe());
                tasks.push(tokio::spawn(handler.run()));

                let driver = Arc::clone(driver);
                let shutdown = shutdown_rx.clone();
                tasks.push(tokio::spawn(async move { driver.run(shutdown).await }));
                info!(
                    provider = ?self.config.provider_rpc,
                    receiver = ?self.config.receiver_contract,
                    "chain subscription enabled"
                );
            }
            None => warn!("SPLICE_PROVIDER_RPC is not set; payments will not be reconciled"),
        }

        let listener = self.server.bind().await.context("Failed to bind HTTP listener")?;
        let addr = listener
            .local_addr()
            .context("Failed to read HTTP listener address")?;
        let server = tokio::spawn(self.server.serve(listener, shutdown_rx));

        info!(addr = %addr, content_dir = %self.config.content_dir.display(), "Splice is running");

        Ok(RuntimeHandle {
            addr,
            shutdown_tx,
            server,
            tasks,
        })
    }
}

/// Running tasks of a started runtime.
pub struct RuntimeHandle {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<Result<(), ServerError>>,
    tasks: Vec<JoinHandle<()>>,
}

impl RuntimeHandle {
    /// Bound HTTP address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal every task and wait for them, up to `grace` each.
    pub async fn shutdown(self, grace: Duration) -> Result<()> {
        info!("Initiating graceful shutdown...");
        // Receivers may already be gone if a task exited on its own.
        let _ = self.shutdown_tx.send(true);

        match tokio::time::timeout(grace, self.server).await {
            Ok(Ok(result)) => result.context("HTTP server failed")?,
            Ok(Err(join)) => error!(error = %join, "HTTP server task panicked"),
            Err(_) => warn!("HTTP server did not stop within the grace period"),
        }

        for task in self.tasks {
            match tokio::time::timeout(grace, task).await {
                Ok(Ok(())) => {}
                Ok(Err(join)) => error!(error = %join, "background task panicked"),
                Err(_) => warn!("background task did not stop within the grace period"),
            }
        }

        info!("Shutdown complete");
        Ok(())
    }
}
