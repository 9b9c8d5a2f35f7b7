//! Folder rollup report.
//!
//! One row per folder node with its direct and transitive counts and sizes,
//! filtered by a minimum descendant count and sorted for display.

use std::cmp::Ordering;

use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use driveaudit_core::{ItemId, Node, ResolutionState, Role};
use driveaudit_tree::AuditTree;

/// Sort order of folder rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FolderSort {
    /// Alphabetical by path.
    #[default]
    Path,
    /// Largest descendant count first.
    Count,
    /// Largest descendant size first.
    Size,
}

/// Configuration for the folder report.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct FolderReportConfig {
    /// Folders with fewer descendants are left out.
    #[builder(default = "0")]
    pub min_descendants: u64,

    /// Row order.
    #[builder(default)]
    pub sort_by: FolderSort,

    /// Keep at most this many rows.
    #[builder(default)]
    pub max_rows: Option<usize>,

    /// Include folders whose lookup failed.
    #[builder(default = "true")]
    pub include_unreachable: bool,
}

impl Default for FolderReportConfig {
    fn default() -> Self {
        Self {
            min_descendants: 0,
            sort_by: FolderSort::Path,
            max_rows: None,
            include_unreachable: true,
        }
    }
}

impl FolderReportConfig {
    /// Create a new config builder.
    pub fn builder() -> FolderReportConfigBuilder {
        FolderReportConfigBuilder::default()
    }
}

/// One folder in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRow {
    pub id: ItemId,
    pub name: String,
    pub path: String,
    pub role: Option<Role>,
    pub state: ResolutionState,
    pub direct_count: u64,
    pub direct_size: u64,
    pub descendant_count: u64,
    pub descendant_size: u64,
    pub owners: Vec<String>,
    pub url: Option<String>,
}

impl FolderRow {
    fn from_node(node: &Node) -> Self {
        Self {
            id: node.id().clone(),
            name: node.name().to_string(),
            path: node.cached_path().unwrap_or_default().to_string(),
            role: node.role(),
            state: node.state(),
            direct_count: node.direct_child_count(),
            direct_size: node.direct_child_size(),
            descendant_count: node.cached_descendant_count().unwrap_or_default(),
            descendant_size: node.cached_descendant_size().unwrap_or_default(),
            owners: node.owners().to_vec(),
            url: node.url().map(str::to_string),
        }
    }
}

/// Results of the folder report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderReport {
    /// Rows after filtering, sorting and truncation.
    pub rows: Vec<FolderRow>,
    /// Folders in the tree.
    pub total_folders: u64,
    /// Folders that passed the filters, before truncation.
    pub matching_folders: u64,
    /// Root containers.
    pub root_count: u64,
    /// Orphan tops.
    pub orphan_count: u64,
    /// Folders whose lookup failed.
    pub unreachable_count: u64,
}

impl FolderReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether rows were dropped by the row limit.
    pub fn is_truncated(&self) -> bool {
        (self.rows.len() as u64) < self.matching_folders
    }
}

/// Builds [`FolderReport`]s.
#[derive(Debug, Default)]
pub struct FolderReporter {
    config: FolderReportConfig,
}

impl FolderReporter {
    /// Create a reporter with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reporter with custom config.
    pub fn with_config(config: FolderReportConfig) -> Self {
        Self { config }
    }

    /// Build the report over a finished audit.
    pub fn report(&self, tree: &AuditTree) -> FolderReport {
        let nodes = || tree.registry.iter().map(|(_, node)| node);
        let role_count = |role: Role| nodes().filter(|n| n.role() == Some(role)).count() as u64;

        let matching: Vec<FolderRow> = nodes()
            .filter(|n| self.config.include_unreachable || !n.is_failed())
            .map(FolderRow::from_node)
            .filter(|row| row.descendant_count >= self.config.min_descendants)
            .sorted_by(|a, b| self.compare(a, b))
            .collect();
        let matching_folders = matching.len() as u64;

        let rows = match self.config.max_rows {
            Some(limit) => matching.into_iter().take(limit).collect(),
            None => matching,
        };
        debug!(rows = rows.len(), matching = matching_folders, "built folder report");

        FolderReport {
            rows,
            total_folders: tree.registry.len() as u64,
            matching_folders,
            root_count: role_count(Role::Root),
            orphan_count: role_count(Role::Orphan),
            unreachable_count: nodes().filter(|n| n.is_failed()).count() as u64,
        }
    }

    fn compare(&self, a: &FolderRow, b: &FolderRow) -> Ordering {
        let primary = match self.config.sort_by {
            FolderSort::Path => Ordering::Equal,
            FolderSort::Count => b.descendant_count.cmp(&a.descendant_count),
            FolderSort::Size => b.descendant_size.cmp(&a.descendant_size),
        };
        primary
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.id.cmp(&b.id))
    }
}
