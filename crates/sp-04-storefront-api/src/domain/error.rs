//! Storefront error types and their HTTP mapping.
//!
//! Every failure leaves the API as
//! `{ "error": { "code": "<snake_case>", "message": "..." } }`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shared_types::{Address, StoreError};
use sp_03_download_auth::AuthError;
use thiserror::Error;
use tracing::error;

/// Order desk failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("invalid payer address: {0}")]
    InvalidAddress(String),

    #[error("catalog item {0} not found")]
    ItemNotFound(String),

    #[error("no payment request for {key} by {payer}")]
    NoPaymentRequest { key: String, payer: Address },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    /// Backend failure. The detail is logged, not returned.
    pub fn storage(err: &StoreError) -> Self {
        error!(error = %err, "store failure while serving request");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            "storage is temporarily unavailable",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::InvalidAddress(_) => ApiError::bad_request(err.to_string()),
            OrderError::ItemNotFound(_) | OrderError::NoPaymentRequest { .. } => {
                ApiError::not_found("not_found", err.to_string())
            }
            OrderError::Store(store) => ApiError::storage(store),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        match &err {
            AuthError::InvalidRequest(_) => ApiError::bad_request(err.to_string()),
            AuthError::InvalidSignature(_)
            | AuthError::SignerMismatch { .. }
            | AuthError::NonceReused => ApiError::unauthorized(code, err.to_string()),
            AuthError::ItemNotFound(_)
            | AuthError::NoPaymentRequest { .. }
            | AuthError::NotPaid { .. }
            | AuthError::ContentUnavailable(_) => ApiError::not_found(code, err.to_string()),
            AuthError::Store(detail) => {
                error!(error = %detail, "store failure during download authorization");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "storage is temporarily unavailable",
                )
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::storage(&err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server bind error: {0}")]
    Bind(String),

    #[error("server error: {0}")]
    Serve(String),
}
