//! Per-channel counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Channel metrics, updated from the driver thread
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Frames handed over by the driver
    pub frames_received: AtomicU64,

    /// Frames that reached the slot
    pub frames_published: AtomicU64,

    /// Published frames that replaced an unconsumed one
    pub frames_overwritten: AtomicU64,

    /// Frames dropped because conversion failed
    pub conversion_failures: AtomicU64,

    /// Frames that raced into a stop or reconfiguration
    pub frames_discarded: AtomicU64,
}

impl ChannelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self, overwrote: bool) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.frames_overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_conversion_failure(&self) {
        self.conversion_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.frames_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ChannelMetricsSnapshot {
        ChannelMetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.load(Ordering::Relaxed),
            conversion_failures: self.conversion_failures.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelMetricsSnapshot {
    pub frames_received: u64,
    pub frames_published: u64,
    pub frames_overwritten: u64,
    pub conversion_failures: u64,
    pub frames_discarded: u64,
}
