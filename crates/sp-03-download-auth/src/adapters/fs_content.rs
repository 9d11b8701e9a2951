//! Filesystem content: one `<key>.txt` file per catalog item.

use crate::ports::ContentProvider;
use async_trait::async_trait;
use shared_types::{CatalogItem, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FsContentProvider {
    root: PathBuf,
}

impl FsContentProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for `key`, or `None` if the key could escape the content root.
    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let unsafe_key = key.is_empty()
            || key.contains(['/', '\\', '\0'])
            || key.contains("..");
        if unsafe_key {
            return None;
        }
        Some(self.root.join(format!("{key}.txt")))
    }
}

#[async_trait]
impl ContentProvider for FsContentProvider {
    async fn load(&self, item: &CatalogItem) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(path) = self.path_for(&item.key) else {
            debug!(key = %item.key, "refusing unsafe content key");
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "content file missing");
                Ok(None)
            }
            Err(e) => Err(StoreError::Backend(format!("{}: {e}", path.display()))),
        }
    }
}
