//! Wire shapes. All JSON is camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Address, CatalogItem, PaymentRequest, TxHash};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemDto {
    pub key: String,
    pub title: String,
    pub price_cents: u64,
}

impl From<CatalogItem> for CatalogItemDto {
    fn from(item: CatalogItem) -> Self {
        Self {
            key: item.key,
            title: item.title,
            price_cents: item.price_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestDto {
    pub id: u64,
    pub catalog_key: String,
    pub payer: Address,
    pub required_cents: u64,
    pub fulfilled: bool,
    pub fulfilled_tx: Option<TxHash>,
    pub paid_cents: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRequest> for PaymentRequestDto {
    fn from(request: PaymentRequest) -> Self {
        Self {
            id: request.id.0,
            fulfilled: request.is_fulfilled(),
            catalog_key: request.catalog_key,
            payer: request.payer,
            required_cents: request.required_cents,
            fulfilled_tx: request.fulfilled_tx,
            paid_cents: request.paid_cents,
            created_at: request.created_at,
        }
    }
}

/// `POST /catalog/{key}/order`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBody {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub payment_request: PaymentRequestDto,
    pub receiver_address: Address,
    /// 32-byte hex word to pass as `paymentId`.
    pub payment_reference: String,
    /// Decimal wei amount that covers the price at the current rate.
    pub native_quote_wei: Option<String>,
}

/// `POST /catalog/{key}/download`
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadBody {
    pub address: String,
    pub nonce: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
