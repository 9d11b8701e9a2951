//! # RocksDB Store
//!
//! Durable implementation of the repository ports.
//!
//! ## Column Families
//!
//! - `catalog` - catalog key -> bincode `CatalogItem`
//! - `payments` - big-endian id -> bincode `PaymentRequest`
//! - `payment_index` - `key \0 payer id` -> empty (lookup by item and payer)
//! - `metadata` - id counter and chain cursor
//!
//! Point reads run inline. Scans and writes run on the blocking pool.
//! Writes that read-check-write (id allocation and conditional fulfillment)
//! run under `write_lock` and commit one `WriteBatch`, so they are atomic
//! with respect to each other.

use crate::ports::{CatalogRepository, CursorStore, FulfillmentWrite, PaymentRepository};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction,
    IteratorMode, Options, WriteBatch, WriteOptions, DB,
};
use shared_types::{
    Address, CatalogItem, NewPaymentRequest, PaymentRequest, PaymentRequestId, StoreError, TxHash,
};
use std::sync::Arc;
use tracing::{debug, info};

pub const CF_CATALOG: &str = "catalog";
pub const CF_PAYMENTS: &str = "payments";
pub const CF_PAYMENT_INDEX: &str = "payment_index";
pub const CF_METADATA: &str = "metadata";

/// All column families used by the store
pub const COLUMN_FAMILIES: &[&str] = &[CF_CATALOG, CF_PAYMENTS, CF_PAYMENT_INDEX, CF_METADATA];

const KEY_LAST_PAYMENT_ID: &[u8] = b"last_payment_id";
const KEY_CHAIN_CURSOR: &[u8] = b"chain_cursor";

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// fsync after each write (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/splice".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (small buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 2 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed store implementing every repository port.
pub struct RocksDbStore {
    inner: Arc<RocksInner>,
}

struct RocksInner {
    db: DB,
    config: RocksDbConfig,
    write_lock: Mutex<()>,
}

fn backend(context: &str, e: rocksdb::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", context, e))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Codec(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

/// `catalog_key \0 payer` prefix of the payment index.
fn index_prefix(catalog_key: &str, payer: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(catalog_key.len() + 1 + 20 + 8);
    key.extend_from_slice(catalog_key.as_bytes());
    key.push(0);
    key.extend_from_slice(payer.as_bytes());
    key
}

impl RocksDbStore {
    /// Open or create the database.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| backend("failed to open RocksDB", e))?;

        info!(path = %config.path, "RocksDB payment store opened");

        Ok(Self {
            inner: Arc::new(RocksInner {
                db,
                config,
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// Run `op` on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&RocksInner) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| StoreError::Backend(format!("blocking store task failed: {e}")))?
    }
}

impl RocksInner {
    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family {}", name)))
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }

    fn get_item(&self, key: &str) -> Result<Option<CatalogItem>, StoreError> {
        let cf = self.cf(CF_CATALOG)?;
        match self
            .db
            .get_cf(cf, key.as_bytes())
            .map_err(|e| backend("catalog get failed", e))?
        {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn get_payment(&self, id: PaymentRequestId) -> Result<Option<PaymentRequest>, StoreError> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self
            .db
            .get_cf(cf, id.0.to_be_bytes())
            .map_err(|e| backend("payment get failed", e))?
        {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn get_cursor(&self) -> Result<Option<u64>, StoreError> {
        let meta = self.cf(CF_METADATA)?;
        match self
            .db
            .get_cf(meta, KEY_CHAIN_CURSOR)
            .map_err(|e| backend("cursor read failed", e))?
        {
            Some(bytes) => decode_u64(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Ids indexed for an (item, payer) pair, ascending.
    fn indexed_ids(
        &self,
        catalog_key: &str,
        payer: &Address,
    ) -> Result<Vec<PaymentRequestId>, StoreError> {
        let cf = self.cf(CF_PAYMENT_INDEX)?;
        let prefix = index_prefix(catalog_key, payer);
        let mut ids = Vec::new();

        for entry in self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, _) = entry.map_err(|e| backend("index scan failed", e))?;
            if !key.starts_with(&prefix) {
                break;
            }
            ids.push(PaymentRequestId(decode_u64(&key[prefix.len()..])?));
        }
        Ok(ids)
    }

    fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let cf = self.cf(CF_CATALOG)?;
        let mut items = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry.map_err(|e| backend("catalog scan failed", e))?;
            items.push(decode(&value)?);
        }
        Ok(items)
    }

    fn upsert_item(&self, item: &CatalogItem) -> Result<(), StoreError> {
        let cf = self.cf(CF_CATALOG)?;
        self.db
            .put_cf_opt(cf, item.key.as_bytes(), encode(item)?, &self.write_options())
            .map_err(|e| backend("catalog put failed", e))
    }

    fn latest(
        &self,
        catalog_key: &str,
        payer: &Address,
        fulfilled_only: bool,
    ) -> Result<Option<PaymentRequest>, StoreError> {
        for id in self.indexed_ids(catalog_key, payer)?.into_iter().rev() {
            if let Some(request) = self.get_payment(id)? {
                if !fulfilled_only || request.is_fulfilled() {
                    return Ok(Some(request));
                }
            }
        }
        Ok(None)
    }

    fn save_new(&self, draft: NewPaymentRequest) -> Result<PaymentRequest, StoreError> {
        let _guard = self.write_lock.lock();

        if self.get_item(&draft.catalog_key)?.is_none() {
            return Err(StoreError::UnknownItem(draft.catalog_key));
        }

        let meta = self.cf(CF_METADATA)?;
        let last_id = match self
            .db
            .get_cf(meta, KEY_LAST_PAYMENT_ID)
            .map_err(|e| backend("id counter read failed", e))?
        {
            Some(bytes) => decode_u64(&bytes)?,
            None => 0,
        };
        let id = PaymentRequestId(last_id + 1);
        let request = PaymentRequest::pending(id, draft, Utc::now());

        let mut index_key = index_prefix(&request.catalog_key, &request.payer);
        index_key.extend_from_slice(&id.0.to_be_bytes());

        let mut batch = WriteBatch::default();
        batch.put_cf(meta, KEY_LAST_PAYMENT_ID, id.0.to_be_bytes());
        batch.put_cf(self.cf(CF_PAYMENTS)?, id.0.to_be_bytes(), encode(&request)?);
        batch.put_cf(self.cf(CF_PAYMENT_INDEX)?, index_key, b"");
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| backend("payment insert failed", e))?;

        debug!(id = %id, key = %request.catalog_key, payer = %request.payer, "payment request stored");
        Ok(request)
    }

    fn try_mark_fulfilled(
        &self,
        id: PaymentRequestId,
        tx_hash: TxHash,
        paid_cents: u64,
    ) -> Result<FulfillmentWrite, StoreError> {
        let _guard = self.write_lock.lock();

        let Some(mut request) = self.get_payment(id)? else {
            return Ok(FulfillmentWrite::Missing);
        };
        if let Some(existing) = request.fulfilled_tx {
            return Ok(FulfillmentWrite::AlreadyFulfilled { existing });
        }

        request.fulfilled_tx = Some(tx_hash);
        request.paid_cents = Some(paid_cents);
        self.db
            .put_cf_opt(
                self.cf(CF_PAYMENTS)?,
                id.0.to_be_bytes(),
                encode(&request)?,
                &self.write_options(),
            )
            .map_err(|e| backend("fulfillment write failed", e))?;

        Ok(FulfillmentWrite::Applied(request))
    }

    fn save_cursor(&self, next_block: u64) -> Result<(), StoreError> {
        let meta = self.cf(CF_METADATA)?;
        self.db
            .put_cf_opt(meta, KEY_CHAIN_CURSOR, next_block.to_be_bytes(), &self.write_options())
            .map_err(|e| backend("cursor write failed", e))
    }
}

#[async_trait]
impl CatalogRepository for RocksDbStore {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        self.blocking(|inner| inner.list_items()).await
    }

    async fn find_item(&self, key: &str) -> Result<Option<CatalogItem>, StoreError> {
        self.inner.get_item(key)
    }

    async fn upsert_item(&self, item: CatalogItem) -> Result<(), StoreError> {
        self.blocking(move |inner| inner.upsert_item(&item)).await
    }
}

#[async_trait]
impl PaymentRepository for RocksDbStore {
    async fn find_by_id(&self, id: PaymentRequestId) -> Result<Option<PaymentRequest>, StoreError> {
        self.inner.get_payment(id)
    }

    async fn find_latest_by_item_and_payer(
        &self,
        catalog_key: &str,
        payer: &Address,
    ) -> Result<Option<PaymentRequest>, StoreError> {
        let (key, payer) = (catalog_key.to_string(), *payer);
        self.blocking(move |inner| inner.latest(&key, &payer, false))
            .await
    }

    async fn find_latest_fulfilled_by_item_and_payer(
        &self,
        catalog_key: &str,
        payer: &Address,
    ) -> Result<Option<PaymentRequest>, StoreError> {
        let (key, payer) = (catalog_key.to_string(), *payer);
        self.blocking(move |inner| inner.latest(&key, &payer, true))
            .await
    }

    async fn save_new(&self, draft: NewPaymentRequest) -> Result<PaymentRequest, StoreError> {
        self.blocking(move |inner| inner.save_new(draft)).await
    }

    async fn try_mark_fulfilled(
        &self,
        id: PaymentRequestId,
        tx_hash: TxHash,
        paid_cents: u64,
    ) -> Result<FulfillmentWrite, StoreError> {
        self.blocking(move |inner| inner.try_mark_fulfilled(id, tx_hash, paid_cents))
            .await
    }
}

#[async_trait]
impl CursorStore for RocksDbStore {
    async fn load_cursor(&self) -> Result<Option<u64>, StoreError> {
        self.inner.get_cursor()
    }

    async fn save_cursor(&self, next_block: u64) -> Result<(), StoreError> {
        self.blocking(move |inner| inner.save_cursor(next_block)).await
    }
}
