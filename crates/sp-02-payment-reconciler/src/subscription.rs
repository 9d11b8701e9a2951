//! # Chain Subscription Driver
//!
//! Pulls payment events from a [`ChainEventSource`] in bounded block ranges
//! and hands them to the reconciler one at a time, in chain order.
//!
//! ## Cursor
//!
//! Processing resumes at `max(start_block, persisted cursor)`. The cursor
//! advances to `to + 1` only after every event in `[from, to]` has been
//! reconciled, so a crash or a transient store failure replays the range.
//! Replays are harmless because reconciliation is idempotent.
//!
//! ## Failures
//!
//! Provider failures surface to [`SubscriptionDriver::run`], which logs them
//! and retries with exponential backoff. The driver never exits on its own.

use crate::domain::{ConfigError, FeedError, ReconcileError, Reconciled};
use crate::ports::{ChainEventSource, PaymentReconcilerApi};
use parking_lot::Mutex;
use shared_types::TxHash;
use sp_01_payment_store::CursorStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// First block to scan when no cursor is persisted.
    pub start_block: u64,
    /// Maximum blocks per `fetch_events` call.
    pub max_block_range: u64,
    /// Delay between polls once caught up with the head.
    pub poll_interval: Duration,
    /// Initial delay after a failed poll.
    pub retry_backoff: Duration,
    /// Cap on the retry delay.
    pub max_retry_backoff: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            max_block_range: 2000,
            poll_interval: Duration::from_secs(3),
            retry_backoff: Duration::from_secs(1),
            max_retry_backoff: Duration::from_secs(60),
        }
    }
}

impl SubscriptionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_block_range == 0 {
            return Err(ConfigError::ZeroBlockRange);
        }
        Ok(())
    }
}

/// Why a poll stopped early.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Reading or writing the store failed; the current range will be replayed.
    #[error("store unavailable: {0}")]
    Store(String),
}

/// Progress notifications for observers (metrics, tests).
#[derive(Debug, Clone)]
pub enum DriverEvent {
    Reconciled {
        block_number: u64,
        tx_hash: TxHash,
        outcome: Result<Reconciled, ReconcileError>,
    },
    RangeCompleted {
        from: u64,
        to: u64,
    },
    PollFailed {
        error: String,
    },
}

/// Summary of one [`SubscriptionDriver::poll_once`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub head: u64,
    pub ranges: u32,
    pub events: usize,
    pub fulfilled: usize,
    pub rejected: usize,
    /// Next block to process after this poll.
    pub next_block: u64,
}

pub struct SubscriptionDriver {
    source: Arc<dyn ChainEventSource>,
    reconciler: Arc<dyn PaymentReconcilerApi>,
    cursor_store: Option<Arc<dyn CursorStore>>,
    config: SubscriptionConfig,
    next_block: Mutex<Option<u64>>,
    events_tx: broadcast::Sender<DriverEvent>,
}

impl SubscriptionDriver {
    pub fn new(
        source: Arc<dyn ChainEventSource>,
        reconciler: Arc<dyn PaymentReconcilerApi>,
        config: SubscriptionConfig,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            reconciler,
            cursor_store: None,
            config,
            next_block: Mutex::new(None),
            events_tx,
        }
    }

    /// Persist progress so a restart resumes where it left off.
    pub fn with_cursor_store(mut self, store: Arc<dyn CursorStore>) -> Self {
        self.cursor_store = Some(store);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DriverEvent> {
        self.events_tx.subscribe()
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Next block to process, once the driver has resumed.
    pub fn next_block(&self) -> Option<u64> {
        *self.next_block.lock()
    }

    fn publish(&self, event: DriverEvent) {
        // No receivers is fine.
        let _ = self.events_tx.send(event);
    }

    async fn resume_point(&self) -> Result<u64, DriverError> {
        let cached = *self.next_block.lock();
        if let Some(next) = cached {
            return Ok(next);
        }

        let persisted = match &self.cursor_store {
            Some(store) => store
                .load_cursor()
                .await
                .map_err(|e| DriverError::Store(e.to_string()))?,
            None => None,
        };
        let next = persisted
            .map_or(self.config.start_block, |cursor| cursor.max(self.config.start_block));
        info!(
            start_block = self.config.start_block,
            persisted = ?persisted,
            resume_at = next,
            "chain subscription resuming"
        );
        *self.next_block.lock() = Some(next);
        Ok(next)
    }

    async fn commit(&self, from: u64, to: u64) -> Result<u64, DriverError> {
        let next = to.saturating_add(1);
        if let Some(store) = &self.cursor_store {
            store
                .save_cursor(next)
                .await
                .map_err(|e| DriverError::Store(e.to_string()))?;
        }
        *self.next_block.lock() = Some(next);
        self.publish(DriverEvent::RangeCompleted { from, to });
        Ok(next)
    }

    /// Catch up from the cursor to the current head.
    pub async fn poll_once(&self) -> Result<PollReport, DriverError> {
        let mut next = self.resume_point().await?;
        let head = self.source.head_block().await?;
        let mut report = PollReport {
            head,
            next_block: next,
            ..PollReport::default()
        };

        let span = self.config.max_block_range.max(1) - 1;

        while next <= head {
            let from = next;
            let to = head.min(from.saturating_add(span));

            let mut events = self.source.fetch_events(from, to).await?;
            events.sort_by_key(|e| (e.block_number, e.log_index));
            debug!(from, to, events = events.len(), "processing block range");

            for event in &events {
                let outcome = self.reconciler.reconcile(event).await;
                match &outcome {
                    Err(err) if err.is_transient() => {
                        warn!(from, to, error = %err, "store failure, range will be replayed");
                        return Err(DriverError::Store(err.to_string()));
                    }
                    Err(_) => report.rejected += 1,
                    Ok(Reconciled::Fulfilled { .. }) => report.fulfilled += 1,
                    Ok(Reconciled::AlreadyFulfilled { .. }) => {}
                }
                report.events += 1;
                self.publish(DriverEvent::Reconciled {
                    block_number: event.block_number,
                    tx_hash: event.tx_hash,
                    outcome,
                });
            }

            next = self.commit(from, to).await?;
            report.ranges += 1;
            report.next_block = next;
            if to == u64::MAX {
                break;
            }
        }

        Ok(report)
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            max_block_range = self.config.max_block_range,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "chain subscription started"
        );
        let mut backoff = self.config.retry_backoff;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let delay = match self.poll_once().await {
                Ok(report) => {
                    backoff = self.config.retry_backoff;
                    if report.events > 0 {
                        info!(
                            events = report.events,
                            fulfilled = report.fulfilled,
                            rejected = report.rejected,
                            next_block = report.next_block,
                            "chain events processed"
                        );
                    }
                    self.config.poll_interval
                }
                Err(err) => {
                    let delay = backoff;
                    warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "chain poll failed");
                    self.publish(DriverEvent::PollFailed {
                        error: err.to_string(),
                    });
                    backoff = (backoff * 2).min(self.config.max_retry_backoff);
                    delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(next_block = ?self.next_block(), "chain subscription stopped");
    }
}
