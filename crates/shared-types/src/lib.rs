//! # Shared Types Crate
//!
//! Domain entities and value objects used across the Splice crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: catalog items, payment requests and chain
//!   payment events are defined once, here.
//! - **Byte-level identity**: addresses and hashes are fixed-size byte arrays.
//!   Hex casing is a presentation concern, so `0xAbC..` and `0xabc..` are the
//!   same payer.
//! - **Integer money**: fiat amounts are whole cents (`u64`), chain amounts are
//!   smallest-unit `U256` integers.

pub mod entities;
pub mod errors;
pub mod primitives;

pub use entities::*;
pub use errors::*;
pub use primitives::*;

pub use primitive_types::U256;
