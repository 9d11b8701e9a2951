//! # Inbound Ports
//!
//! API exposed by the reconciler to the subscription driver.

use crate::domain::{ReconcileError, Reconciled};
use async_trait::async_trait;
use shared_types::ChainPaymentEvent;

/// Applies one chain payment event to the payment record store.
///
/// Implementations must be idempotent: delivering the same event any number
/// of times has the same effect as delivering it once.
#[async_trait]
pub trait PaymentReconcilerApi: Send + Sync {
    async fn reconcile(&self, event: &ChainPaymentEvent) -> Result<Reconciled, ReconcileError>;
}
