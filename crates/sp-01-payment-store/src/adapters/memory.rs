//! In-memory store backed by `parking_lot` locks.
//!
//! All ports are implemented on one struct so the catalog, payments and
//! cursor share a single consistent view. No lock is held across an await.

use crate::ports::{CatalogRepository, CursorStore, FulfillmentWrite, PaymentRepository};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{
    Address, CatalogItem, NewPaymentRequest, PaymentRequest, PaymentRequestId, StoreError, TxHash,
};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct Inner {
    items: BTreeMap<String, CatalogItem>,
    payments: BTreeMap<PaymentRequestId, PaymentRequest>,
    last_id: u64,
    cursor: Option<u64>,
}

/// Volatile store. Data is lost on restart; the chain subscription
/// replays from its configured start block to rebuild fulfillment state.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create pre-populated with catalog items.
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for item in items {
                inner.items.insert(item.key.clone(), item);
            }
        }
        store
    }

    /// Number of stored payment requests.
    pub fn payment_count(&self) -> usize {
        self.inner.read().payments.len()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        Ok(self.inner.read().items.values().cloned().collect())
    }

    async fn find_item(&self, key: &str) -> Result<Option<CatalogItem>, StoreError> {
        Ok(self.inner.read().items.get(key).cloned())
    }

    async fn upsert_item(&self, item: CatalogItem) -> Result<(), StoreError> {
        self.inner.write().items.insert(item.key.clone(), item);
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn find_by_id(&self, id: PaymentRequestId) -> Result<Option<PaymentRequest>, StoreError> {
        Ok(self.inner.read().payments.get(&id).cloned())
    }

    async fn find_latest_by_item_and_payer(
        &self,
        catalog_key: &str,
        payer: &Address,
    ) -> Result<Option<PaymentRequest>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .payments
            .values()
            .rev()
            .find(|p| p.catalog_key == catalog_key && p.payer == *payer)
            .cloned())
    }

    async fn find_latest_fulfilled_by_item_and_payer(
        &self,
        catalog_key: &str,
        payer: &Address,
    ) -> Result<Option<PaymentRequest>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .payments
            .values()
            .rev()
            .find(|p| p.catalog_key == catalog_key && p.payer == *payer && p.is_fulfilled())
            .cloned())
    }

    async fn save_new(&self, draft: NewPaymentRequest) -> Result<PaymentRequest, StoreError> {
        let mut inner = self.inner.write();
        if !inner.items.contains_key(&draft.catalog_key) {
            return Err(StoreError::UnknownItem(draft.catalog_key));
        }
        inner.last_id += 1;
        let id = PaymentRequestId(inner.last_id);
        let request = PaymentRequest::pending(id, draft, Utc::now());
        inner.payments.insert(id, request.clone());
        debug!(id = %id, key = %request.catalog_key, payer = %request.payer, "payment request stored");
        Ok(request)
    }

    async fn try_mark_fulfilled(
        &self,
        id: PaymentRequestId,
        tx_hash: TxHash,
        paid_cents: u64,
    ) -> Result<FulfillmentWrite, StoreError> {
        let mut inner = self.inner.write();
        let Some(request) = inner.payments.get_mut(&id) else {
            return Ok(FulfillmentWrite::Missing);
        };
        if let Some(existing) = request.fulfilled_tx {
            return Ok(FulfillmentWrite::AlreadyFulfilled { existing });
        }
        request.fulfilled_tx = Some(tx_hash);
        request.paid_cents = Some(paid_cents);
        Ok(FulfillmentWrite::Applied(request.clone()))
    }
}

#[async_trait]
impl CursorStore for InMemoryStore {
    async fn load_cursor(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.inner.read().cursor)
    }

    async fn save_cursor(&self, next_block: u64) -> Result<(), StoreError> {
        self.inner.write().cursor = Some(next_block);
        Ok(())
    }
}
