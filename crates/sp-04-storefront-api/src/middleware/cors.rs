//! CORS layer built from [`CorsConfig`].

use crate::domain::CorsConfig;
use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

fn parse_all<T: std::str::FromStr>(values: &[String]) -> Vec<T> {
    values.iter().filter_map(|v| v.parse().ok()).collect()
}

/// Build the storefront CORS policy. Disabled CORS allows everything.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::very_permissive();
    }

    let wildcard = |values: &[String]| values.iter().any(|v| v == "*");

    let mut cors = CorsLayer::new().allow_methods(parse_all::<Method>(&config.allowed_methods));

    cors = if wildcard(&config.allowed_origins) {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(parse_all::<HeaderValue>(&config.allowed_origins))
    };

    cors = if wildcard(&config.allowed_headers) {
        cors.allow_headers(Any)
    } else {
        cors.allow_headers(parse_all::<HeaderName>(&config.allowed_headers))
    };

    if !config.expose_headers.is_empty() {
        cors = cors.expose_headers(parse_all::<HeaderName>(&config.expose_headers));
    }

    cors = cors.max_age(Duration::from_secs(config.max_age));

    // Credentials cannot be combined with a wildcard origin.
    if config.allow_credentials && !wildcard(&config.allowed_origins) {
        cors = cors.allow_credentials(true);
    }

    cors
}
