//! Successful reconciliation outcomes.

use shared_types::{PaymentRequestId, TxHash};

/// What an accepted event did to its payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The request was unfulfilled and is now settled by this transaction.
    Fulfilled {
        id: PaymentRequestId,
        tx_hash: TxHash,
        paid_cents: u64,
    },
    /// The request was already settled; nothing changed.
    AlreadyFulfilled {
        id: PaymentRequestId,
        existing: TxHash,
        /// The event is a redelivery of the transaction that settled it.
        replay: bool,
    },
}

impl Reconciled {
    pub fn id(&self) -> PaymentRequestId {
        match self {
            Reconciled::Fulfilled { id, .. } | Reconciled::AlreadyFulfilled { id, .. } => *id,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Reconciled::Fulfilled { .. } => "fulfilled",
            Reconciled::AlreadyFulfilled { replay: true, .. } => "replay",
            Reconciled::AlreadyFulfilled { replay: false, .. } => "already_fulfilled",
        }
    }
}
