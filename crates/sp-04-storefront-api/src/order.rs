//! # Order Desk
//!
//! Creates payment requests with the item's current price snapshotted, and
//! quotes the native amount the buyer should send.

use crate::domain::OrderError;
use primitive_types::U256;
use shared_types::{Address, NewPaymentRequest, PaymentRequest};
use sp_01_payment_store::{CatalogRepository, PaymentRepository};
use sp_02_payment_reconciler::PaymentPricer;
use std::sync::Arc;
use tracing::info;

/// A freshly created payment request and what the buyer needs to pay it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub payment_request: PaymentRequest,
    /// Payment receiver contract.
    pub receiver_address: Address,
    /// `paymentId` argument for the contract call.
    pub payment_reference: String,
    /// Smallest native amount that covers the price; `None` if it cannot be quoted.
    pub native_quote_wei: Option<U256>,
}

pub struct OrderDesk {
    catalog: Arc<dyn CatalogRepository>,
    payments: Arc<dyn PaymentRepository>,
    pricer: Arc<PaymentPricer>,
    receiver: Address,
}

impl OrderDesk {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        payments: Arc<dyn PaymentRepository>,
        pricer: Arc<PaymentPricer>,
        receiver: Address,
    ) -> Self {
        Self {
            catalog,
            payments,
            pricer,
            receiver,
        }
    }

    pub fn receiver_address(&self) -> Address {
        self.receiver
    }

    /// Record a new, unfulfilled payment request for `(key, address)`.
    pub async fn create_order(&self, key: &str, address: &str) -> Result<OrderReceipt, OrderError> {
        let payer = parse_payer(address)?;

        let item = self
            .catalog
            .find_item(key)
            .await?
            .ok_or_else(|| OrderError::ItemNotFound(key.to_string()))?;

        let payment_request = self
            .payments
            .save_new(NewPaymentRequest {
                catalog_key: item.key.clone(),
                payer,
                required_cents: item.price_cents,
            })
            .await?;

        let native_quote_wei = self.pricer.quote(&Address::NATIVE, item.price_cents);

        info!(
            id = %payment_request.id,
            key = %item.key,
            payer = %payer,
            required_cents = item.price_cents,
            quote_wei = ?native_quote_wei.map(|q| q.to_string()),
            "payment request created"
        );

        Ok(OrderReceipt {
            payment_reference: payment_request.id.to_reference(),
            payment_request,
            receiver_address: self.receiver,
            native_quote_wei,
        })
    }

    /// The most recently created request for `(key, address)`.
    pub async fn latest_request(&self, key: &str, address: &str) -> Result<PaymentRequest, OrderError> {
        let payer = parse_payer(address)?;

        if self.catalog.find_item(key).await?.is_none() {
            return Err(OrderError::ItemNotFound(key.to_string()));
        }

        self.payments
            .find_latest_by_item_and_payer(key, &payer)
            .await?
            .ok_or_else(|| OrderError::NoPaymentRequest {
                key: key.to_string(),
                payer,
            })
    }
}

fn parse_payer(address: &str) -> Result<Address, OrderError> {
    if address.trim().is_empty() {
        return Err(OrderError::InvalidAddress("address is required".into()));
    }
    Address::parse(address.trim()).map_err(|e| OrderError::InvalidAddress(e.to_string()))
}
