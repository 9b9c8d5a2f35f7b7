//! Reports over a finished driveaudit run.
//!
//! This crate turns an [`AuditTree`] into display-ready rows:
//!
//! - **Folder rollups** - direct and transitive counts and sizes per folder
//! - **Flagged items** - every tracked item with its full path, flags and
//!   sharing detail, plus per-flag totals
//!
//! Reports only read the tree; every path and aggregate they show was
//! computed by the audit.
//!
//! ```rust,ignore
//! use driveaudit_report::{FolderReportConfig, FolderReporter, FolderSort};
//!
//! let config = FolderReportConfig::builder()
//!     .min_descendants(10u64)
//!     .sort_by(FolderSort::Size)
//!     .build()
//!     .unwrap();
//! let report = FolderReporter::with_config(config).report(&tree);
//!
//! for row in &report.rows {
//!     println!("{:>8} {}", row.descendant_count, row.path);
//! }
//! ```

mod folders;
mod tracked;

pub use folders::{FolderReport, FolderReportConfig, FolderReportConfigBuilder, FolderReporter, FolderRow, FolderSort};
pub use tracked::{
    FlagCount, TrackedReport, TrackedReportConfig, TrackedReportConfigBuilder, TrackedReporter,
    TrackedRow,
};

// Re-export types reports are built from
pub use driveaudit_tree::{AuditTree, Flag};
