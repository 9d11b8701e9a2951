//! # SP-02 Payment Reconciler
//!
//! Turns on-chain `PaymentReceived` events into fulfilled payment requests.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`PaymentReconciler`] | validates one event and conditionally fulfills its request |
//! | [`PaymentPricer`] | values token amounts in cents, quotes native amounts |
//! | [`SubscriptionDriver`] | polls the chain in bounded ranges and feeds the reconciler |
//! | [`JsonRpcEventSource`] | `eth_blockNumber` / `eth_getLogs` adapter |
//!
//! ## Guarantees
//!
//! - A request is fulfilled by the first qualifying event, in chain order.
//! - Replays and later payments never overwrite the fulfilling transaction.
//! - Underpayments, unknown tokens and unknown references are logged and
//!   skipped; they never stop the subscription.

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod pricer;
pub mod service;
pub mod subscription;

pub use adapters::{payment_received_topic, JsonRpcEventSource, PAYMENT_RECEIVED_SIGNATURE};
pub use domain::{
    decode_payment_reference, min_amount_for_cents, to_cents, ConfigError, FeedError,
    ReconcileError, Reconciled, ReconcilerConfig, TokenPricing, DEFAULT_NATIVE_CENTS_PER_UNIT,
    DEFAULT_TOKEN_DECIMALS, NATIVE_DECIMALS, PEGGED_CENTS_PER_UNIT,
};
pub use ports::{
    ChainEventSource, FixedRateSource, MockChainEventSource, PaymentReconcilerApi, RateSource,
};
pub use pricer::PaymentPricer;
pub use service::PaymentReconciler;
pub use subscription::{DriverError, DriverEvent, PollReport, SubscriptionConfig, SubscriptionDriver};
