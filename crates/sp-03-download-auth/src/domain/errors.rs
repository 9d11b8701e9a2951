//! # Domain Errors

use shared_types::{Address, PaymentRequestId, StoreError};
use thiserror::Error;

/// Signature parsing and recovery failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("signature is not valid hex")]
    InvalidHex,

    /// r or s is zero or not below the curve order.
    #[error("signature scalar out of range")]
    InvalidScalar,

    /// s is in the upper half of the curve order (EIP-2).
    #[error("malleable signature (high s)")]
    MalleableSignature,

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("signing failed")]
    SigningFailed,
}

/// Reasons a download is refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed address or nonce.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// The signature is valid but was produced by another key.
    #[error("signature does not belong to {claimed}")]
    SignerMismatch { claimed: Address, recovered: Address },

    #[error("nonce already used")]
    NonceReused,

    #[error("catalog item {0} not found")]
    ItemNotFound(String),

    #[error("no payment request for {key} by {payer}")]
    NoPaymentRequest { key: String, payer: Address },

    #[error("payment request {id} for {key} is not paid")]
    NotPaid { key: String, id: PaymentRequestId },

    /// Paid, but the content file is missing.
    #[error("content for {0} is unavailable")]
    ContentUnavailable(String),

    #[error("store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Stable snake_case code for API bodies and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::InvalidSignature(_) | AuthError::SignerMismatch { .. } => "unauthorized",
            AuthError::NonceReused => "nonce_reused",
            AuthError::ItemNotFound(_) | AuthError::NoPaymentRequest { .. } => "not_found",
            AuthError::NotPaid { .. } => "not_paid",
            AuthError::ContentUnavailable(_) => "content_unavailable",
            AuthError::Store(_) => "store_error",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}
