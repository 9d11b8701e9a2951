//! # Domain Errors
//!
//! Rejection reasons for a single payment event, chain feed failures and
//! configuration errors.

use shared_types::{Address, PaymentRequestId, StoreError};
use thiserror::Error;

/// Why an event did not fulfill a payment request.
///
/// Every variant except [`ReconcileError::Store`] is final: retrying the same
/// event can never succeed, so the caller logs it and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The payment reference is neither a hex word nor a decimal id.
    #[error("undecodable payment reference: {reference}")]
    DecodeError { reference: String },

    /// No payment request with the decoded id.
    #[error("payment request {id} not found")]
    NotFound { id: PaymentRequestId },

    /// Token is neither native nor allowlisted.
    #[error("unsupported token {token}")]
    UnsupportedToken { token: Address },

    /// Paid value is below the price snapshot.
    #[error("payment request {id} underpaid: {paid_cents} < {required_cents} cents")]
    InsufficientAmount {
        id: PaymentRequestId,
        paid_cents: u64,
        required_cents: u64,
    },

    /// Backend failure while reading or writing the request.
    #[error("store error: {0}")]
    Store(String),
}

impl ReconcileError {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::DecodeError { .. } => "decode_error",
            ReconcileError::NotFound { .. } => "not_found",
            ReconcileError::UnsupportedToken { .. } => "unsupported_token",
            ReconcileError::InsufficientAmount { .. } => "insufficient_amount",
            ReconcileError::Store(_) => "store_error",
        }
    }

    /// Whether the same event may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReconcileError::Store(_))
    }
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        ReconcileError::Store(err.to_string())
    }
}

/// Chain event feed failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// Provider unreachable or returned an RPC error.
    #[error("provider connectivity: {0}")]
    Connectivity(String),

    /// Provider answered with something that is not a valid response.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Invalid reconciler configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("token {token} has unsupported decimals {decimals}")]
    InvalidDecimals { token: Address, decimals: u8 },

    #[error("native sentinel address cannot be allowlisted as a token")]
    NativeSentinelAsToken,

    #[error("max block range must be at least 1")]
    ZeroBlockRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_errors_are_transient() {
        assert!(ReconcileError::Store("io".into()).is_transient());
        assert!(!ReconcileError::NotFound {
            id: PaymentRequestId(1)
        }
        .is_transient());
        assert!(!ReconcileError::DecodeError {
            reference: "zz".into()
        }
        .is_transient());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ReconcileError = StoreError::Backend("disk full".into()).into();
        assert_eq!(err.reason(), "store_error");
        assert!(err.to_string().contains("disk full"));
    }
}
