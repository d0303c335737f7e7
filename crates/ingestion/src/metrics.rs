//! Coordinator counters

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use contracts::IngestResult;

/// In-process counters, shared by every request
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Batches fully accepted
    batches_success: AtomicU64,
    /// Batches answered with partial_success
    batches_partial: AtomicU64,
    /// Empty batches rejected before any call
    batches_rejected: AtomicU64,
    /// Records across all processed batches
    records: AtomicU64,
    /// Failed publish attempts
    publish_failures: AtomicU64,
    /// Insert error descriptors reported
    insert_errors: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a merged batch
    pub fn record_result(&self, result: &IngestResult) {
        if result.is_success() {
            self.batches_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.batches_partial.fetch_add(1, Ordering::Relaxed);
        }
        self.records
            .fetch_add(result.processed_count as u64, Ordering::Relaxed);
        self.publish_failures
            .fetch_add(result.publish_failures() as u64, Ordering::Relaxed);
        let insert_errors = result.insert_errors.as_ref().map_or(0, Vec::len);
        self.insert_errors
            .fetch_add(insert_errors as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_success: self.batches_success.load(Ordering::Relaxed),
            batches_partial: self.batches_partial.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            insert_errors: self.insert_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of coordinator counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_success: u64,
    pub batches_partial: u64,
    pub batches_rejected: u64,
    pub records: u64,
    pub publish_failures: u64,
    pub insert_errors: u64,
}

impl MetricsSnapshot {
    pub fn batches(&self) -> u64 {
        self.batches_success + self.batches_partial
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ingest Summary ===")?;
        writeln!(
            f,
            "Batches: {} (success {}, partial {})",
            self.batches(),
            self.batches_success,
            self.batches_partial
        )?;
        writeln!(f, "Rejected empty batches: {}", self.batches_rejected)?;
        writeln!(f, "Records: {}", self.records)?;
        writeln!(f, "Publish failures: {}", self.publish_failures)?;
        write!(f, "Insert errors: {}", self.insert_errors)
    }
}
