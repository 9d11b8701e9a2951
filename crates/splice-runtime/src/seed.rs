//! Starter catalog for fresh installs.

use shared_types::{CatalogItem, StoreError};
use sp_01_payment_store::CatalogRepository;
use tracing::info;

/// The launch titles, priced in cents.
pub fn default_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("979-8749522310", "Alice in Wonderland", 597),
        CatalogItem::new("978-0345806789", "The Shining", 999),
        CatalogItem::new("978-0060850524", "Brave New World", 1034),
    ]
}

/// Insert `items` if the catalog is empty. Returns how many were written.
pub async fn seed_if_empty(
    catalog: &dyn CatalogRepository,
    items: Vec<CatalogItem>,
) -> Result<usize, StoreError> {
    if !catalog.list_items().await?.is_empty() {
        return Ok(0);
    }

    let count = items.len();
    for item in items {
        info!(key = %item.key, title = %item.title, price_cents = item.price_cents, "seeding catalog item");
        catalog.upsert_item(item).await?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_01_payment_store::InMemoryStore;

    #[tokio::test]
    async fn test_seeds_empty_store_once() {
        let store = InMemoryStore::new();

        assert_eq!(seed_if_empty(&store, default_catalog()).await.unwrap(), 3);
        assert_eq!(seed_if_empty(&store, default_catalog()).await.unwrap(), 0);

        let shining = store.find_item("978-0345806789").await.unwrap().unwrap();
        assert_eq!(shining.title, "The Shining");
        assert_eq!(shining.price_cents, 999);
    }

    #[tokio::test]
    async fn test_existing_catalog_is_untouched() {
        let store = InMemoryStore::with_items([CatalogItem::new("custom", "Custom", 100)]);
        assert_eq!(seed_if_empty(&store, default_catalog()).await.unwrap(), 0);
        assert_eq!(store.list_items().await.unwrap().len(), 1);
    }
}
