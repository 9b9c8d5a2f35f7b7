//! Audit progress reporting.

use std::time::{Duration, Instant};

use driveaudit_core::AuditStats;

/// Progress information during an audit.
#[derive(Debug, Clone, Default)]
pub struct AuditProgress {
    /// Items recorded so far.
    pub items_processed: u64,
    /// Folders among them.
    pub folders_seen: u64,
    /// Declared bytes seen so far.
    pub bytes_seen: u64,
    /// Items flagged so far.
    pub tracked_items: u64,
    /// Warnings recorded so far.
    pub warnings_count: u64,
    /// Name of the most recently recorded item.
    pub current_name: String,
    /// Time elapsed since the audit started.
    pub elapsed: Duration,
}

impl AuditProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items recorded per second.
    pub fn items_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.items_processed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Builds progress snapshots from the running stats.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    interval: u64,
}

impl ProgressTracker {
    pub fn new(interval: u64) -> Self {
        Self {
            start_time: Instant::now(),
            interval: interval.max(1),
        }
    }

    /// Whether a snapshot is due after `items` recorded items.
    pub fn is_due(&self, items: u64) -> bool {
        items > 0 && items % self.interval == 0
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self, stats: &AuditStats, warnings: usize, current_name: &str) -> AuditProgress {
        AuditProgress {
            items_processed: stats.items_recorded,
            folders_seen: stats.folders_recorded,
            bytes_seen: stats.total_size,
            tracked_items: stats.tracked_items,
            warnings_count: warnings as u64,
            current_name: current_name.to_string(),
            elapsed: self.elapsed(),
        }
    }
}
