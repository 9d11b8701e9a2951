//! # Domain Entities
//!
//! Catalog items, payment requests and the chain payment event that settles them.

use crate::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A sellable digital item, keyed by an ISBN-like catalog key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique catalog key (e.g. `978-0345806789`).
    pub key: String,
    /// Display title. Also names the downloaded file.
    pub title: String,
    /// Current retail price in cents.
    pub price_cents: u64,
}

impl CatalogItem {
    pub fn new(key: impl Into<String>, title: impl Into<String>, price_cents: u64) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            price_cents,
        }
    }
}

/// Monotonically assigned payment request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentRequestId(pub u64);

impl PaymentRequestId {
    /// The id as a 32-byte big-endian ABI word (the `uint256 paymentId`
    /// argument the buyer passes to the receiver contract).
    pub fn to_word(self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&self.0.to_be_bytes());
        word
    }

    /// `0x`-prefixed hex encoding of [`Self::to_word`].
    pub fn to_reference(self) -> String {
        format!("0x{}", hex::encode(self.to_word()))
    }
}

impl fmt::Display for PaymentRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields supplied at order time. The store assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentRequest {
    pub catalog_key: String,
    pub payer: Address,
    /// Price snapshot taken from the catalog item at creation.
    pub required_cents: u64,
}

/// One buyer's intent to purchase one catalog item.
///
/// ## Invariants
///
/// - `required_cents` never changes after creation.
/// - `fulfilled_tx` goes from `None` to `Some` at most once and is never
///   overwritten or cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: PaymentRequestId,
    pub catalog_key: String,
    pub payer: Address,
    pub required_cents: u64,
    /// Transaction that fulfilled this request.
    pub fulfilled_tx: Option<TxHash>,
    /// Fiat value of the fulfilling payment, in cents.
    pub paid_cents: Option<u64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl PaymentRequest {
    /// Build a fresh, unfulfilled request.
    pub fn pending(id: PaymentRequestId, draft: NewPaymentRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            catalog_key: draft.catalog_key,
            payer: draft.payer,
            required_cents: draft.required_cents,
            fulfilled_tx: None,
            paid_cents: None,
            created_at,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled_tx.is_some()
    }
}

/// A decoded `PaymentReceived` log from the receiver contract.
///
/// Delivered at least once; replays carry the same `tx_hash` and `log_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPaymentEvent {
    pub block_number: u64,
    pub tx_hash: TxHash,
    pub log_index: u64,
    pub payer: Address,
    /// Raw amount in the token's smallest unit.
    pub amount: U256,
    /// Token contract, or [`Address::NATIVE`] for the native coin.
    pub token: Address,
    /// Encoded payment request id as emitted on chain (hex word or decimal).
    pub payment_reference: String,
}
