//! # Inbound Ports
//!
//! API exposed to the storefront for signed downloads.

use crate::domain::AuthError;
use async_trait::async_trait;
use shared_types::{Address, CatalogItem, PaymentRequestId};

/// A buyer's signed request for content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub catalog_key: String,
    /// Address exactly as the client sent it; it is part of the signed payload.
    pub address: String,
    pub nonce: String,
    /// 65-byte `r ‖ s ‖ v` signature, hex encoded.
    pub signature: String,
}

/// Content released to a verified, paying buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedDownload {
    pub item: CatalogItem,
    pub payer: Address,
    /// Payment request that granted access.
    pub request_id: PaymentRequestId,
    pub content: Vec<u8>,
}

impl AuthorizedDownload {
    /// Attachment file name: `<title>.txt`.
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.item.title)
    }
}

#[async_trait]
pub trait DownloadAuthorizationApi: Send + Sync {
    async fn authorize(&self, request: &DownloadRequest) -> Result<AuthorizedDownload, AuthError>;
}
