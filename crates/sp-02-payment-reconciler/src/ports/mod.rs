//! # Ports Layer
//!
//! Hexagonal boundaries of the reconciler.

pub mod inbound;
pub mod outbound;

pub use inbound::PaymentReconcilerApi;
pub use outbound::{ChainEventSource, FixedRateSource, MockChainEventSource, RateSource};
