//! Recorder metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RecorderMetrics {
    /// Jobs handed to the pipeline
    submitted: AtomicU64,
    /// Bitmaps fully written
    written: AtomicU64,
    /// Failed writes
    failures: AtomicU64,
    /// Bytes written to disk
    bytes: AtomicU64,
    /// Submissions that had to wait for the previous write
    waits: AtomicU64,
    /// Longest wait for the previous write, in microseconds
    max_wait_us: AtomicU64,
}

impl RecorderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self, bytes: u64) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wait(&self, micros: u64) {
        self.waits.fetch_add(1, Ordering::Relaxed);
        self.max_wait_us.fetch_max(micros, Ordering::Relaxed);
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> RecorderMetricsSnapshot {
        RecorderMetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            written: self.written(),
            failures: self.failures(),
            bytes: self.bytes.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            max_wait_us: self.max_wait_us.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of recorder metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderMetricsSnapshot {
    pub submitted: u64,
    pub written: u64,
    pub failures: u64,
    pub bytes: u64,
    pub waits: u64,
    pub max_wait_us: u64,
}
