//! # Download Authorizer
//!
//! Releases content only to the wallet that paid for it.
//!
//! ## Checks, in order
//!
//! 1. The address and nonce are well formed (else `400`).
//! 2. The signature recovers to the claimed address (else `401`).
//! 3. The item exists and the latest fulfilled request for (item, address)
//!    exists (else `404`, distinguishing "never ordered" from "not paid").
//! 4. Content is available (else `404`).
//! 5. The `(address, nonce)` pair has not been used before (else `401`).
//!
//! The nonce is only spent by a request that would otherwise succeed.

use crate::domain::{download_digest, recover_signer, AuthError, NonceRegistry, RecoverableSignature, MAX_NONCE_LENGTH};
use crate::ports::{AuthorizedDownload, ContentProvider, DownloadAuthorizationApi, DownloadRequest};
use async_trait::async_trait;
use shared_types::Address;
use sp_01_payment_store::{CatalogRepository, PaymentRepository};
use std::sync::Arc;
use tracing::{info, warn};

pub struct DownloadAuthorizer {
    catalog: Arc<dyn CatalogRepository>,
    payments: Arc<dyn PaymentRepository>,
    content: Arc<dyn ContentProvider>,
    nonces: Option<NonceRegistry>,
}

impl DownloadAuthorizer {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        payments: Arc<dyn PaymentRepository>,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            catalog,
            payments,
            content,
            nonces: None,
        }
    }

    /// Reject reused `(address, nonce)` pairs.
    pub fn with_nonce_registry(mut self, registry: NonceRegistry) -> Self {
        self.nonces = Some(registry);
        self
    }

    /// Verify the signature and return the signer.
    pub fn verify_signer(&self, request: &DownloadRequest) -> Result<Address, AuthError> {
        let claimed = Address::parse(&request.address)
            .map_err(|e| AuthError::InvalidRequest(format!("address: {e}")))?;

        if request.nonce.is_empty() || request.nonce.len() > MAX_NONCE_LENGTH {
            return Err(AuthError::InvalidRequest(format!(
                "nonce must be 1..={MAX_NONCE_LENGTH} bytes"
            )));
        }

        let signature = RecoverableSignature::parse_hex(&request.signature)?;
        let digest = download_digest(&request.address, &request.catalog_key, &request.nonce);
        let recovered = recover_signer(&digest, &signature)?;

        if recovered != claimed {
            return Err(AuthError::SignerMismatch { claimed, recovered });
        }
        Ok(claimed)
    }

    async fn authorize_inner(&self, request: &DownloadRequest) -> Result<AuthorizedDownload, AuthError> {
        let payer = self.verify_signer(request)?;
        let key = request.catalog_key.as_str();

        let item = self
            .catalog
            .find_item(key)
            .await?
            .ok_or_else(|| AuthError::ItemNotFound(key.to_string()))?;

        let paid = match self
            .payments
            .find_latest_fulfilled_by_item_and_payer(key, &payer)
            .await?
        {
            Some(paid) => paid,
            None => {
                return Err(
                    match self.payments.find_latest_by_item_and_payer(key, &payer).await? {
                        Some(pending) => AuthError::NotPaid {
                            key: key.to_string(),
                            id: pending.id,
                        },
                        None => AuthError::NoPaymentRequest {
                            key: key.to_string(),
                            payer,
                        },
                    },
                );
            }
        };

        let content = self
            .content
            .load(&item)
            .await?
            .ok_or_else(|| AuthError::ContentUnavailable(key.to_string()))?;

        if let Some(registry) = &self.nonces {
            if !registry.record(payer, &request.nonce) {
                return Err(AuthError::NonceReused);
            }
        }

        Ok(AuthorizedDownload {
            item,
            payer,
            request_id: paid.id,
            content,
        })
    }
}

#[async_trait]
impl DownloadAuthorizationApi for DownloadAuthorizer {
    async fn authorize(&self, request: &DownloadRequest) -> Result<AuthorizedDownload, AuthError> {
        let result = self.authorize_inner(request).await;
        match &result {
            Ok(download) => info!(
                key = %download.item.key,
                payer = %download.payer,
                request_id = %download.request_id,
                bytes = download.content.len(),
                "download authorized"
            ),
            Err(err) => warn!(
                key = %request.catalog_key,
                address = %request.address,
                code = err.code(),
                error = %err,
                "download refused"
            ),
        }
        result
    }
}
