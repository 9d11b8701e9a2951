//! # Download Nonce Registry
//!
//! Remembers `(address, nonce)` pairs that already authorized a download so
//! a captured signature cannot be replayed. Entries expire after the
//! retention window and are garbage-collected periodically, which bounds
//! memory.

use parking_lot::Mutex;
use shared_types::Address;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Longest nonce accepted.
pub const MAX_NONCE_LENGTH: usize = 128;

struct Entries {
    seen: HashMap<(Address, String), u64>,
    last_gc: u64,
}

pub struct NonceRegistry {
    entries: Mutex<Entries>,
    retention_secs: u64,
    gc_interval_secs: u64,
}

impl NonceRegistry {
    pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

    pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(60);

    pub fn new(retention: Duration) -> Self {
        Self::with_gc_interval(retention, Self::DEFAULT_GC_INTERVAL)
    }

    pub fn with_gc_interval(retention: Duration, gc_interval: Duration) -> Self {
        Self {
            entries: Mutex::new(Entries {
                seen: HashMap::new(),
                last_gc: current_timestamp(),
            }),
            retention_secs: retention.as_secs(),
            gc_interval_secs: gc_interval.as_secs(),
        }
    }

    /// Record a pair. Returns `false` if it was already recorded and is still
    /// inside the retention window.
    pub fn record(&self, address: Address, nonce: &str) -> bool {
        self.record_at(address, nonce, current_timestamp())
    }

    pub fn record_at(&self, address: Address, nonce: &str, now: u64) -> bool {
        let mut entries = self.entries.lock();

        if now.saturating_sub(entries.last_gc) >= self.gc_interval_secs {
            let threshold = now.saturating_sub(self.retention_secs);
            entries.seen.retain(|_, seen_at| *seen_at > threshold);
            entries.last_gc = now;
        }

        let key = (address, nonce.to_string());
        if let Some(seen_at) = entries.seen.get(&key) {
            if now.saturating_sub(*seen_at) < self.retention_secs {
                return false;
            }
        }
        entries.seen.insert(key, now);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceRegistry {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RETENTION)
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
