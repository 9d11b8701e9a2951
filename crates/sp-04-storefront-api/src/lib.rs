//! # SP-04 Storefront API
//!
//! The buyer-facing HTTP surface: browse the catalog, open a payment request,
//! check its status and download paid content with a wallet signature.
//!
//! **Architecture:** axum router over the payment store, pricer and download
//! authorizer, behind a tower middleware stack.
//!
//! ## Middleware (outermost first)
//!
//! | Layer | Purpose |
//! |-------|---------|
//! | [`TracingLayer`] | request span, `x-request-id`, HTTP metrics |
//! | CORS | browser access from the storefront client |
//! | Timeout | per-request deadline, `408` on expiry |
//! | Body limit | reject oversized bodies |
//!
//! ## Errors
//!
//! Failures are JSON `{ "error": { "code", "message" } }` with `400` for bad
//! input, `401` for signature problems, `404` for unknown or unpaid items and
//! `500` for storage failures.

#![warn(clippy::all)]

pub mod domain;
pub mod middleware;
pub mod order;
pub mod routes;
pub mod service;

pub use domain::{ApiConfig, ApiError, ConfigError, CorsConfig, OrderError, ServerError};
pub use middleware::{create_cors_layer, TracingLayer};
pub use order::{OrderDesk, OrderReceipt};
pub use routes::{build_router, AppState, CATALOG_TITLE_HEADER};
pub use service::StorefrontServer;
