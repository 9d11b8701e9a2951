//! # Outbound Ports

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{CatalogItem, StoreError};
use std::collections::HashMap;

/// Source of downloadable content.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Content bytes for `item`, or `None` if none is stored.
    async fn load(&self, item: &CatalogItem) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Content held in memory, keyed by catalog key.
#[derive(Default)]
pub struct InMemoryContentProvider {
    content: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.content.write().insert(key.into(), content.into());
    }
}

#[async_trait]
impl ContentProvider for InMemoryContentProvider {
    async fn load(&self, item: &CatalogItem) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.content.read().get(&item.key).cloned())
    }
}
