//! HTTP routes.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/catalog` | list items |
//! | POST | `/catalog/:key/order` | create a payment request |
//! | GET | `/catalog/:key/payments/:address` | latest payment request |
//! | POST | `/catalog/:key/download` | signed download |
//! | GET | `/health` | liveness |
//! | GET | `/metrics` | Prometheus exposition |

use crate::domain::{
    ApiConfig, ApiError, CatalogItemDto, DownloadBody, HealthResponse, OrderBody, OrderResponse,
    PaymentRequestDto,
};
use crate::middleware::{create_cors_layer, TracingLayer};
use crate::order::OrderDesk;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use sp_01_payment_store::CatalogRepository;
use sp_03_download_auth::{DownloadAuthorizationApi, DownloadRequest};
use splice_telemetry::{encode_metrics, DOWNLOADS, ORDERS_CREATED};
use std::sync::Arc;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

pub const CATALOG_TITLE_HEADER: &str = "x-catalog-title";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub orders: Arc<OrderDesk>,
    pub downloads: Arc<dyn DownloadAuthorizationApi>,
}

/// Storefront router with the middleware stack applied.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    Router::new()
        .route("/catalog", get(list_catalog))
        .route("/catalog/:key/order", post(create_order))
        .route("/catalog/:key/payments/:address", get(payment_status))
        .route("/catalog/:key/download", post(download))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(create_cors_layer(&config.cors))
        .layer(TracingLayer::new())
}

async fn list_catalog(State(state): State<AppState>) -> Result<Json<Vec<CatalogItemDto>>, ApiError> {
    let items = state.catalog.list_items().await?;
    Ok(Json(items.into_iter().map(CatalogItemDto::from).collect()))
}

async fn create_order(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: Result<Json<OrderBody>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(body) = payload?;
    let address = body.address.unwrap_or_default();

    let receipt = state.orders.create_order(&key, &address).await?;
    ORDERS_CREATED.inc();

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            payment_request: receipt.payment_request.into(),
            receiver_address: receipt.receiver_address,
            payment_reference: receipt.payment_reference,
            native_quote_wei: receipt.native_quote_wei.map(|wei| wei.to_string()),
        }),
    ))
}

async fn payment_status(
    State(state): State<AppState>,
    Path((key, address)): Path<(String, String)>,
) -> Result<Json<PaymentRequestDto>, ApiError> {
    let request = state.orders.latest_request(&key, &address).await?;
    Ok(Json(request.into()))
}

async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: Result<Json<DownloadBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload.inspect_err(|_| {
        DOWNLOADS.with_label_values(&["invalid_request"]).inc();
    })?;

    let request = DownloadRequest {
        catalog_key: key,
        address: body.address,
        nonce: body.nonce,
        signature: body.signature,
    };

    let granted = match state.downloads.authorize(&request).await {
        Ok(granted) => granted,
        Err(e) => {
            DOWNLOADS.with_label_values(&[e.code()]).inc();
            return Err(e.into());
        }
    };

    let headers = attachment_headers(&granted.item.title, &granted.file_name())?;
    DOWNLOADS.with_label_values(&["served"]).inc();
    info!(
        key = %granted.item.key,
        payer = %granted.payer,
        request_id = %granted.request_id,
        bytes = granted.content.len(),
        "download served"
    );

    Ok((StatusCode::OK, headers, granted.content).into_response())
}

/// `text/plain` attachment headers naming the file after the title.
fn attachment_headers(title: &str, file_name: &str) -> Result<HeaderMap, ApiError> {
    let file_name: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| {
            warn!(title, error = %e, "title is not a valid header value");
            ApiError::internal("cannot encode attachment headers")
        })?;
    let title = HeaderValue::from_str(title)
        .map_err(|_| ApiError::internal("cannot encode attachment headers"))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(HeaderName::from_static(CATALOG_TITLE_HEADER), title);
    Ok(headers)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn metrics() -> Result<Response, ApiError> {
    let body = encode_metrics().map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
