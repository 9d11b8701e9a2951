//! # Adapters
//!
//! Concrete chain feed implementations.

pub mod json_rpc;

pub use json_rpc::{payment_received_topic, JsonRpcEventSource, PAYMENT_RECEIVED_SIGNATURE};
