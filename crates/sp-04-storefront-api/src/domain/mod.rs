pub mod config;
pub mod dto;
pub mod error;

pub use config::{ApiConfig, ConfigError, CorsConfig};
pub use dto::*;
pub use error::{ApiError, OrderError, ServerError};
