//! # Integration Tests
//!
//! Purchase flows across the store, reconciler, authorizer and HTTP API.

pub mod download_flows;
pub mod http_flows;
pub mod payment_flows;
