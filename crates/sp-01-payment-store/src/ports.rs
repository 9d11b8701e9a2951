//! # Repository Ports
//!
//! Storage traits consumed by the reconciler, order desk and download
//! authorizer. All methods are async so adapters may do I/O.

use async_trait::async_trait;
use shared_types::{
    Address, CatalogItem, NewPaymentRequest, PaymentRequest, PaymentRequestId, StoreError, TxHash,
};

/// Catalog of sellable items.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All items, ordered by catalog key.
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError>;

    /// Item by catalog key.
    async fn find_item(&self, key: &str) -> Result<Option<CatalogItem>, StoreError>;

    /// Insert or replace an item. Existing payment requests keep their price snapshot.
    async fn upsert_item(&self, item: CatalogItem) -> Result<(), StoreError>;
}

/// Result of a conditional fulfillment write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentWrite {
    /// The marker was unset and is now set; carries the updated record.
    Applied(PaymentRequest),
    /// The marker was already set; nothing was written.
    AlreadyFulfilled { existing: TxHash },
    /// No request with that id.
    Missing,
}

/// Payment request records.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: PaymentRequestId) -> Result<Option<PaymentRequest>, StoreError>;

    /// Most recently created request for an (item, payer) pair.
    async fn find_latest_by_item_and_payer(
        &self,
        catalog_key: &str,
        payer: &Address,
    ) -> Result<Option<PaymentRequest>, StoreError>;

    /// Most recently created request for an (item, payer) pair whose
    /// fulfillment marker is set.
    async fn find_latest_fulfilled_by_item_and_payer(
        &self,
        catalog_key: &str,
        payer: &Address,
    ) -> Result<Option<PaymentRequest>, StoreError>;

    /// Persist a new request, assigning the next id.
    async fn save_new(&self, draft: NewPaymentRequest) -> Result<PaymentRequest, StoreError>;

    /// Set the fulfillment marker and paid amount if and only if the marker is unset.
    ///
    /// This is a single atomic operation: concurrent callers for the same id
    /// observe exactly one `Applied`.
    async fn try_mark_fulfilled(
        &self,
        id: PaymentRequestId,
        tx_hash: TxHash,
        paid_cents: u64,
    ) -> Result<FulfillmentWrite, StoreError>;
}

/// Persisted "next block to process" for the chain subscription.
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load_cursor(&self) -> Result<Option<u64>, StoreError>;

    async fn save_cursor(&self, next_block: u64) -> Result<(), StoreError>;
}
