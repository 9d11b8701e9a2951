//! # SP-01 Payment Store
//!
//! Persistence for catalog items, payment requests and the chain cursor.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Ports
//!
//! | Port | Purpose |
//! |------|---------|
//! | [`CatalogRepository`] | list, find and upsert catalog items |
//! | [`PaymentRepository`] | create and look up payment requests, conditional fulfillment |
//! | [`CursorStore`] | last processed chain block |
//!
//! ## Adapters
//!
//! - [`InMemoryStore`]: default backend, also used by tests.
//! - `RocksDbStore`: durable backend behind the `rocksdb` feature.
//!
//! ## Fulfillment
//!
//! [`PaymentRepository::try_mark_fulfilled`] is the only mutation of an
//! existing payment request. It writes only while the fulfillment marker is
//! unset, inside one critical section, so a request is fulfilled at most once
//! no matter how many qualifying events arrive.

#![warn(clippy::all)]

pub mod adapters;
pub mod ports;

pub use adapters::memory::InMemoryStore;
#[cfg(feature = "rocksdb")]
pub use adapters::rocks::{RocksDbConfig, RocksDbStore};
pub use ports::{CatalogRepository, CursorStore, FulfillmentWrite, PaymentRepository};
