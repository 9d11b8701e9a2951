//! # Domain Layer
//!
//! Pure reconciliation logic: fiat conversion, reference decoding, outcomes
//! and errors. No I/O.

pub mod errors;
pub mod outcome;
pub mod pricing;
pub mod reference;

pub use errors::{ConfigError, FeedError, ReconcileError};
pub use outcome::Reconciled;
pub use pricing::{
    min_amount_for_cents, to_cents, ReconcilerConfig, TokenPricing, DEFAULT_NATIVE_CENTS_PER_UNIT,
    DEFAULT_TOKEN_DECIMALS, MAX_DECIMALS, NATIVE_DECIMALS, PEGGED_CENTS_PER_UNIT,
};
pub use reference::decode_payment_reference;
