//! # Splice Runtime Library
//!
//! Configuration, wiring and background handlers for the `splice` binary,
//! exposed as a library for tests.
//!
//! - `config` - environment-driven [`SpliceConfig`]
//! - `seed` - launch catalog
//! - `handlers` - chain subscription observers
//! - `runtime` - component wiring and lifecycle

#![warn(clippy::all)]

pub mod config;
pub mod handlers;
pub mod runtime;
pub mod seed;

pub use config::{ConfigError, SpliceConfig};
pub use runtime::{RuntimeHandle, SpliceRuntime, Stores};
