//! Observer of the chain subscription.
//!
//! Turns [`DriverEvent`]s into metrics and operator logs. Reconciliation
//! itself already happened inside the driver; this handler never writes.

use sp_02_payment_reconciler::{DriverEvent, Reconciled};
use splice_telemetry::{FULFILLED_CENTS, NEXT_BLOCK, PAYMENT_EVENTS, POLL_FAILURES};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub struct PaymentEventHandler {
    receiver: broadcast::Receiver<DriverEvent>,
}

impl PaymentEventHandler {
    pub fn new(receiver: broadcast::Receiver<DriverEvent>) -> Self {
        Self { receiver }
    }

    /// Run until the driver is dropped.
    pub async fn run(mut self) {
        info!("payment event handler started");

        loop {
            match self.receiver.recv().await {
                Ok(event) => record(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "payment event handler lagged; metrics undercount");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        info!("payment event handler stopped");
    }
}

fn record(event: &DriverEvent) {
    match event {
        DriverEvent::Reconciled {
            block_number,
            tx_hash,
            outcome,
        } => {
            let label = match outcome {
                Ok(reconciled) => reconciled.label(),
                Err(e) => e.reason(),
            };
            PAYMENT_EVENTS.with_label_values(&[label]).inc();

            match outcome {
                Ok(Reconciled::Fulfilled { id, paid_cents, .. }) => {
                    FULFILLED_CENTS.inc_by(*paid_cents);
                    debug!(id = %id, block = block_number, tx = %tx_hash, "fulfillment recorded");
                }
                Ok(Reconciled::AlreadyFulfilled { .. }) => {}
                Err(e) => {
                    debug!(block = block_number, tx = %tx_hash, reason = e.reason(), "rejection recorded");
                }
            }
        }
        DriverEvent::RangeCompleted { to, .. } => {
            NEXT_BLOCK.set(i64::try_from(to.saturating_add(1)).unwrap_or(i64::MAX));
        }
        DriverEvent::PollFailed { .. } => POLL_FAILURES.inc(),
    }
}
