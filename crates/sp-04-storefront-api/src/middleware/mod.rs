//! Tower middleware for the storefront router.

pub mod cors;
pub mod tracing;

pub use self::cors::create_cors_layer;
pub use self::tracing::{TracingLayer, TracingService, REQUEST_ID_HEADER};
