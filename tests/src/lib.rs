//! # Splice Test Suite
//!
//! Cross-crate purchase flows. Unit tests live next to the code they test;
//! this crate drives the pieces together the way the runtime wires them.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs          # storefront harness, wallets, chain events
//! └── integration/
//!     ├── payment_flows.rs # chain feed → reconciler → store
//!     ├── download_flows.rs# signed downloads against reconciled payments
//!     └── http_flows.rs    # the whole purchase over HTTP
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p splice-tests
//! cargo test -p splice-tests integration::payment_flows
//!
//! # Benchmarks
//! cargo bench -p splice-tests
//! ```

pub mod fixtures;
pub mod integration;
