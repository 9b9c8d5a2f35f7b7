//! Folder-tree resolution and item classification engine for driveaudit.
//!
//! # Overview
//!
//! `driveaudit-tree` rebuilds the folder tree of a remote drive from items
//! that arrive in arbitrary order. Key features:
//!
//! - **Lazy resolution** of folders only ever seen as a parent reference
//! - **Memoized paths and aggregates** over an id-keyed node arena
//! - **Classification** of items against sharing, ownership and storage flags
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use driveaudit_tree::{AuditConfig, DriveAuditor, ListingStore};
//!
//! let store = ListingStore::from_path(Path::new("listing.json")).unwrap();
//! let config = AuditConfig::new("Ada Lovelace");
//! let tree = DriveAuditor::new()
//!     .audit(&config, &store, store.enumerate())
//!     .unwrap();
//!
//! for (id, item) in &tree.tracked {
//!     println!("{id}: {:?}", tree.tracked_path(item));
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use driveaudit_tree::DriveAuditor;
//!
//! let auditor = DriveAuditor::new();
//! let mut progress_rx = auditor.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Recorded {} items", progress.items_processed);
//!     }
//! });
//! ```

mod auditor;
mod classifier;
mod context;
mod listing;
mod progress;
mod registry;
mod store;
mod tree;

pub use auditor::DriveAuditor;
pub use classifier::{Classifier, Flag, ItemFlags, SharingDetail, TrackedItem};
pub use context::{AuditContext, TrackedItems};
pub use listing::{Listing, ListingStore};
pub use progress::AuditProgress;
pub use registry::NodeRegistry;
pub use store::{FetchOutcome, RemoteStore, fetch_with_retry};
pub use tree::AuditTree;

// Re-export core types for convenience
pub use driveaudit_core::{
    AuditConfig, AuditError, AuditStats, AuditWarning, FetchError, ItemId, Node, Permission,
    RemoteItem, Role, WarningKind,
};
