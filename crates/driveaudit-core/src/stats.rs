//! Run statistics.

use serde::{Deserialize, Serialize};

/// Summary counters for an audit run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    /// Items fed in by enumeration.
    pub items_recorded: u64,
    /// Of those, folders.
    pub folders_recorded: u64,
    /// Of those, non-folders.
    pub files_recorded: u64,
    /// Sum of declared sizes over enumerated items.
    pub total_size: u64,
    /// Items that produced a tracked entry.
    pub tracked_items: u64,
    /// Lazy folder lookups issued.
    pub lazy_lookups: u64,
    /// Lazy folder lookups that failed.
    pub lazy_failures: u64,
    /// Permission fetch attempts issued.
    pub permission_fetches: u64,
    /// Items whose permission fetch was abandoned.
    pub enrichments_abandoned: u64,
    /// Deepest node seen, in ancestors.
    pub max_depth: u32,
}

impl AuditStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one enumerated item.
    pub fn record_item(&mut self, is_folder: bool, size: u64) {
        self.items_recorded += 1;
        self.total_size = self.total_size.saturating_add(size);
        if is_folder {
            self.folders_recorded += 1;
        } else {
            self.files_recorded += 1;
        }
    }

    /// Record a lazy lookup and whether it succeeded.
    pub fn record_lookup(&mut self, succeeded: bool) {
        self.lazy_lookups += 1;
        if !succeeded {
            self.lazy_failures += 1;
        }
    }

    /// Record a node depth.
    pub fn record_depth(&mut self, depth: u32) {
        self.max_depth = self.max_depth.max(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = AuditStats::default();
        assert_eq!(stats.items_recorded, 0);
        assert_eq!(stats.total_size, 0);
    }

    #[test]
    fn test_record_item() {
        let mut stats = AuditStats::new();
        stats.record_item(true, 0);
        stats.record_item(false, 1024);

        assert_eq!(stats.items_recorded, 2);
        assert_eq!(stats.folders_recorded, 1);
        assert_eq!(stats.files_recorded, 1);
        assert_eq!(stats.total_size, 1024);
    }

    #[test]
    fn test_record_lookup_and_depth() {
        let mut stats = AuditStats::new();
        stats.record_lookup(true);
        stats.record_lookup(false);
        stats.record_depth(3);
        stats.record_depth(1);

        assert_eq!(stats.lazy_lookups, 2);
        assert_eq!(stats.lazy_failures, 1);
        assert_eq!(stats.max_depth, 3);
    }
}
