//! Audit run driver.

use std::time::Instant;

use driveaudit_core::{AuditConfig, AuditError, AuditWarning, FetchError, RemoteItem, WarningKind};
use tokio::sync::broadcast;
use tracing::info;

use crate::context::AuditContext;
use crate::progress::{AuditProgress, ProgressTracker};
use crate::registry::NodeRegistry;
use crate::store::RemoteStore;
use crate::tree::AuditTree;

/// Feeds an enumeration stream through the registry and finishes the tree.
pub struct DriveAuditor {
    progress_tx: broadcast::Sender<AuditProgress>,
}

impl DriveAuditor {
    /// Create a new auditor.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to audit progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditProgress> {
        self.progress_tx.subscribe()
    }

    /// Run a complete audit.
    ///
    /// `items` is the enumeration stream; `store` serves lazy folder lookups
    /// and permission fetches. Enumeration errors are recorded as warnings.
    /// Only invariant violations abort the run.
    pub fn audit<I>(
        &self,
        config: &AuditConfig,
        store: &dyn RemoteStore,
        items: I,
    ) -> Result<AuditTree, AuditError>
    where
        I: IntoIterator<Item = Result<RemoteItem, FetchError>>,
    {
        config.validate()?;
        let start = Instant::now();
        let tracker = ProgressTracker::new(config.progress_interval);
        let mut cx = AuditContext::new(config, store);
        let mut registry = NodeRegistry::new();
        let mut last_reported = 0;

        for entry in items {
            let item = match entry {
                Ok(item) => item,
                Err(err) => {
                    cx.warn(AuditWarning::new(
                        None,
                        format!("Enumeration error: {err}"),
                        WarningKind::EnumerationError,
                    ));
                    continue;
                }
            };

            let name = item.name.clone();
            registry.record(item, &mut cx)?;

            // Skipped duplicates leave the count unchanged.
            let recorded = cx.stats().items_recorded;
            if recorded != last_reported && tracker.is_due(recorded) {
                last_reported = recorded;
                let _ = self
                    .progress_tx
                    .send(tracker.snapshot(cx.stats(), cx.warnings().len(), &name));
            }
        }
        info!(
            items = cx.stats().items_recorded,
            folders = registry.len(),
            "enumeration complete"
        );

        registry.resolve_all_paths(&mut cx)?;
        registry.aggregate_all()?;

        let (tracked, warnings, stats) = cx.finish();
        info!(
            tracked = stats.tracked_items,
            lazy_lookups = stats.lazy_lookups,
            lazy_failures = stats.lazy_failures,
            warnings = warnings.len(),
            "audit complete"
        );

        Ok(AuditTree::new(
            registry,
            tracked,
            config.clone(),
            stats,
            start.elapsed(),
            warnings,
        ))
    }
}

impl Default for DriveAuditor {
    fn default() -> Self {
        Self::new()
    }
}
