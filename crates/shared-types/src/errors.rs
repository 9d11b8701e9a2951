//! # Error Types
//!
//! Errors shared across crates.

use thiserror::Error;

/// Failure to parse a fixed-size hex value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HexParseError {
    /// Wrong number of bytes.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Errors raised by persistence backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be encoded or decoded.
    #[error("record codec error: {0}")]
    Codec(String),

    /// Referenced catalog item does not exist.
    #[error("catalog item not found: {0}")]
    UnknownItem(String),
}
