//! Flagged-item report.

use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::debug;

use driveaudit_core::ItemId;
use driveaudit_tree::{AuditTree, Flag, ItemFlags, SharingDetail, TrackedItem};

/// Configuration for the tracked-item report.
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into))]
pub struct TrackedReportConfig {
    /// Keep only items with this flag set.
    #[builder(default)]
    pub only_flag: Option<Flag>,

    /// Keep at most this many rows.
    #[builder(default)]
    pub max_rows: Option<usize>,
}

impl TrackedReportConfig {
    /// Create a new config builder.
    pub fn builder() -> TrackedReportConfigBuilder {
        TrackedReportConfigBuilder::default()
    }
}

/// One flagged item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRow {
    pub id: ItemId,
    pub name: String,
    pub url: Option<String>,
    pub path: String,
    pub owners: Vec<String>,
    pub is_folder: bool,
    pub size: Option<u64>,
    pub flags: ItemFlags,
    pub sharing: SharingDetail,
}

impl TrackedRow {
    fn from_item(tree: &AuditTree, item: &TrackedItem) -> Self {
        Self {
            id: item.id().clone(),
            name: item.name().to_string(),
            url: item.item.url.clone(),
            path: tree.tracked_path(item).unwrap_or_default(),
            owners: item.item.owner_display_names(),
            is_folder: item.item.is_folder(),
            size: item.item.size,
            flags: item.flags,
            sharing: item.sharing.clone(),
        }
    }

    /// Flags set on this row, as names.
    pub fn flag_names(&self) -> Vec<String> {
        self.flags
            .set_flags()
            .into_iter()
            .map(|flag| flag.to_string())
            .collect()
    }
}

/// Number of tracked items with a flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCount {
    pub flag: Flag,
    pub count: u64,
}

/// Results of the tracked-item report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedReport {
    /// Rows sorted by path.
    pub rows: Vec<TrackedRow>,
    /// Per-flag counts over all tracked items, in flag order.
    pub flag_counts: Vec<FlagCount>,
    /// Tracked items in the audit.
    pub total_tracked: u64,
    /// Shared items whose sharing detail was fetched.
    pub enriched: u64,
}

impl TrackedReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count for one flag.
    pub fn count_of(&self, flag: Flag) -> u64 {
        self.flag_counts
            .iter()
            .find(|c| c.flag == flag)
            .map_or(0, |c| c.count)
    }
}

/// Builds [`TrackedReport`]s.
#[derive(Debug, Default)]
pub struct TrackedReporter {
    config: TrackedReportConfig,
}

impl TrackedReporter {
    /// Create a reporter with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reporter with custom config.
    pub fn with_config(config: TrackedReportConfig) -> Self {
        Self { config }
    }

    /// Build the report over a finished audit.
    pub fn report(&self, tree: &AuditTree) -> TrackedReport {
        let items = || tree.tracked.values();

        let flag_counts = Flag::iter()
            .map(|flag| FlagCount {
                flag,
                count: items().filter(|item| item.flags.get(flag)).count() as u64,
            })
            .collect();

        let rows = items()
            .filter(|item| self.config.only_flag.is_none_or(|flag| item.flags.get(flag)))
            .map(|item| TrackedRow::from_item(tree, item))
            .sorted_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)))
            .take(self.config.max_rows.unwrap_or(usize::MAX))
            .collect_vec();
        debug!(rows = rows.len(), "built tracked-item report");

        TrackedReport {
            rows,
            flag_counts,
            total_tracked: tree.tracked.len() as u64,
            enriched: items().filter(|item| item.sharing.fetched).count() as u64,
        }
    }
}
