//! # Outbound Ports
//!
//! Traits for external dependencies: the chain event feed and the native
//! coin exchange rate.

use crate::domain::{FeedError, DEFAULT_NATIVE_CENTS_PER_UNIT};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::ChainPaymentEvent;

/// Native coin price in cents per whole coin.
pub trait RateSource: Send + Sync {
    fn native_cents_per_unit(&self) -> u64;
}

/// Source of `PaymentReceived` events emitted by the receiver contract.
#[async_trait]
pub trait ChainEventSource: Send + Sync {
    /// Latest block number known to the provider.
    async fn head_block(&self) -> Result<u64, FeedError>;

    /// Events in the inclusive block range `[from, to]`, in chain order.
    async fn fetch_events(&self, from: u64, to: u64)
        -> Result<Vec<ChainPaymentEvent>, FeedError>;
}

/// Constant exchange rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateSource {
    cents_per_unit: u64,
}

impl FixedRateSource {
    pub fn new(cents_per_unit: u64) -> Self {
        Self { cents_per_unit }
    }
}

impl Default for FixedRateSource {
    fn default() -> Self {
        Self::new(DEFAULT_NATIVE_CENTS_PER_UNIT)
    }
}

impl RateSource for FixedRateSource {
    fn native_cents_per_unit(&self) -> u64 {
        self.cents_per_unit
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockFeed {
    events: Vec<ChainPaymentEvent>,
    head: u64,
    failures_left: u32,
    fetched_ranges: Vec<(u64, u64)>,
}

/// In-memory chain feed for tests.
#[derive(Default)]
pub struct MockChainEventSource {
    feed: Mutex<MockFeed>,
}

impl MockChainEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event; the head advances to cover it.
    pub fn push_event(&self, event: ChainPaymentEvent) {
        let mut feed = self.feed.lock();
        feed.head = feed.head.max(event.block_number);
        feed.events.push(event);
    }

    pub fn set_head(&self, head: u64) {
        self.feed.lock().head = head;
    }

    /// Make the next `count` calls fail with a connectivity error.
    pub fn fail_next(&self, count: u32) {
        self.feed.lock().failures_left = count;
    }

    /// Ranges requested through `fetch_events`, in call order.
    pub fn fetched_ranges(&self) -> Vec<(u64, u64)> {
        self.feed.lock().fetched_ranges.clone()
    }

    fn take_failure(feed: &mut MockFeed) -> Result<(), FeedError> {
        if feed.failures_left > 0 {
            feed.failures_left -= 1;
            return Err(FeedError::Connectivity("mock provider offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainEventSource for MockChainEventSource {
    async fn head_block(&self) -> Result<u64, FeedError> {
        let mut feed = self.feed.lock();
        Self::take_failure(&mut feed)?;
        Ok(feed.head)
    }

    async fn fetch_events(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<ChainPaymentEvent>, FeedError> {
        let mut feed = self.feed.lock();
        Self::take_failure(&mut feed)?;
        feed.fetched_ranges.push((from, to));
        Ok(feed
            .events
            .iter()
            .filter(|e| e.block_number >= from && e.block_number <= to)
            .cloned()
            .collect())
    }
}
