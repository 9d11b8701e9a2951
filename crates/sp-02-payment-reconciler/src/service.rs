//! # Payment Reconciler Service
//!
//! Applies one `PaymentReceived` event to the payment record store:
//!
//! 1. Decode the payment reference into a request id.
//! 2. Look up the request.
//! 3. Value the payment in cents.
//! 4. Compare against the price snapshot.
//! 5. Conditionally set the fulfillment marker.
//!
//! Redelivered or late events for a settled request are acknowledged as
//! [`Reconciled::AlreadyFulfilled`] and never change the record.

use crate::domain::{decode_payment_reference, ReconcileError, Reconciled};
use crate::ports::PaymentReconcilerApi;
use crate::pricer::PaymentPricer;
use async_trait::async_trait;
use shared_types::ChainPaymentEvent;
use sp_01_payment_store::{FulfillmentWrite, PaymentRepository};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PaymentReconciler {
    payments: Arc<dyn PaymentRepository>,
    pricer: Arc<PaymentPricer>,
}

impl PaymentReconciler {
    pub fn new(payments: Arc<dyn PaymentRepository>, pricer: Arc<PaymentPricer>) -> Self {
        Self { payments, pricer }
    }

    pub fn pricer(&self) -> &Arc<PaymentPricer> {
        &self.pricer
    }

    async fn apply(&self, event: &ChainPaymentEvent) -> Result<Reconciled, ReconcileError> {
        let id = decode_payment_reference(&event.payment_reference)?;

        let request = self
            .payments
            .find_by_id(id)
            .await?
            .ok_or(ReconcileError::NotFound { id })?;

        if let Some(existing) = request.fulfilled_tx {
            return Ok(Reconciled::AlreadyFulfilled {
                id,
                existing,
                replay: existing == event.tx_hash,
            });
        }

        let paid_cents = self
            .pricer
            .value_in_cents(&event.token, event.amount)
            .ok_or(ReconcileError::UnsupportedToken { token: event.token })?;

        if paid_cents < request.required_cents {
            return Err(ReconcileError::InsufficientAmount {
                id,
                paid_cents,
                required_cents: request.required_cents,
            });
        }

        match self
            .payments
            .try_mark_fulfilled(id, event.tx_hash, paid_cents)
            .await?
        {
            FulfillmentWrite::Applied(_) => Ok(Reconciled::Fulfilled {
                id,
                tx_hash: event.tx_hash,
                paid_cents,
            }),
            FulfillmentWrite::AlreadyFulfilled { existing } => Ok(Reconciled::AlreadyFulfilled {
                id,
                existing,
                replay: existing == event.tx_hash,
            }),
            FulfillmentWrite::Missing => Err(ReconcileError::NotFound { id }),
        }
    }
}

#[async_trait]
impl PaymentReconcilerApi for PaymentReconciler {
    async fn reconcile(&self, event: &ChainPaymentEvent) -> Result<Reconciled, ReconcileError> {
        let result = self.apply(event).await;

        match &result {
            Ok(Reconciled::Fulfilled { id, paid_cents, .. }) => info!(
                id = %id,
                tx = %event.tx_hash,
                payer = %event.payer,
                paid_cents,
                "payment request fulfilled"
            ),
            Ok(outcome @ Reconciled::AlreadyFulfilled { id, existing, .. }) => debug!(
                id = %id,
                tx = %event.tx_hash,
                existing = %existing,
                outcome = outcome.label(),
                "payment request already fulfilled"
            ),
            Err(err) => warn!(
                tx = %event.tx_hash,
                block = event.block_number,
                reference = %event.payment_reference,
                reason = err.reason(),
                error = %err,
                "payment event rejected"
            ),
        }

        result
    }
}
