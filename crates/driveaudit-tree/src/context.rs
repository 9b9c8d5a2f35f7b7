//! Per-run mutable state threaded through registry operations.

use driveaudit_core::{
    AuditConfig, AuditError, AuditStats, AuditWarning, ItemId, PermissionKind, RemoteItem,
    WarningKind,
};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::classifier::{Classifier, SharingDetail, TrackedItem};
use crate::store::{RemoteStore, fetch_with_retry};

/// Tracked items keyed by item id, in first-seen order.
pub type TrackedItems = IndexMap<ItemId, TrackedItem>;

/// Everything a run mutates besides the node registry itself.
pub struct AuditContext<'a> {
    config: &'a AuditConfig,
    store: &'a dyn RemoteStore,
    tracked: TrackedItems,
    warnings: Vec<AuditWarning>,
    stats: AuditStats,
}

impl<'a> AuditContext<'a> {
    /// Start an empty run context.
    pub fn new(config: &'a AuditConfig, store: &'a dyn RemoteStore) -> Self {
        Self {
            config,
            store,
            tracked: TrackedItems::new(),
            warnings: Vec::new(),
            stats: AuditStats::new(),
        }
    }

    pub fn config(&self) -> &'a AuditConfig {
        self.config
    }

    pub fn store(&self) -> &'a dyn RemoteStore {
        self.store
    }

    pub fn classifier(&self) -> Classifier<'a> {
        Classifier::new(self.config)
    }

    pub fn tracked(&self) -> &TrackedItems {
        &self.tracked
    }

    pub fn warnings(&self) -> &[AuditWarning] {
        &self.warnings
    }

    pub fn stats(&self) -> &AuditStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut AuditStats {
        &mut self.stats
    }

    /// Log a diagnostic and keep it for the report.
    pub fn warn(&mut self, warning: AuditWarning) {
        warn!(
            kind = %warning.kind,
            item = warning.item_id.as_ref().map(ItemId::as_str).unwrap_or("-"),
            "{}",
            warning.message
        );
        self.warnings.push(warning);
    }

    /// Classify an item and, if flagged, store it (enriching shared items
    /// owned by the primary user first).
    ///
    /// Only a sharing-model violation with enforcement on is an error.
    pub fn track(&mut self, item: RemoteItem, parent: Option<ItemId>) -> Result<(), AuditError> {
        let Some(mut tracked) = self.classifier().classify(item, parent) else {
            return Ok(());
        };
        if tracked.needs_enrichment() {
            self.enrich(&mut tracked)?;
        }

        let id = tracked.id().clone();
        if self.tracked.insert(id.clone(), tracked).is_some() {
            self.warn(AuditWarning::new(
                Some(id),
                "Item seen more than once; keeping the latest record",
                WarningKind::DuplicateItem,
            ));
        } else {
            self.stats.tracked_items += 1;
        }
        Ok(())
    }

    fn enrich(&mut self, tracked: &mut TrackedItem) -> Result<(), AuditError> {
        let store = self.store;
        let id = tracked.id().clone();
        let outcome = fetch_with_retry(self.config.permission_fetch_attempts, || {
            store.fetch_permissions(&id)
        });
        self.stats.permission_fetches += u64::from(outcome.attempts);

        let permissions = match outcome.result {
            Ok(permissions) => permissions,
            Err(err) => {
                self.stats.enrichments_abandoned += 1;
                self.warn(AuditWarning::enrichment_abandoned(&id, outcome.attempts, &err));
                return Ok(());
            }
        };
        debug!(item = %id, permissions = permissions.len(), "fetched sharing metadata");

        let unknown = permissions
            .iter()
            .filter(|p| p.kind == PermissionKind::Unknown)
            .count();
        if unknown > 0 {
            self.warn(AuditWarning::new(
                Some(id.clone()),
                format!("{unknown} permission(s) of unrecognized type"),
                WarningKind::UnknownPermissionKind,
            ));
        }

        let detail = SharingDetail::from_permissions(&permissions);
        if let Err(err) = detail.check_model(&id, tracked.flags.shared) {
            if self.config.enforce_sharing_model {
                return Err(err);
            }
            self.warn(AuditWarning::new(
                Some(id),
                err.to_string(),
                WarningKind::SharingModel,
            ));
        }
        tracked.sharing = detail;
        Ok(())
    }

    /// Hand over the accumulated output.
    pub fn finish(self) -> (TrackedItems, Vec<AuditWarning>, AuditStats) {
        (self.tracked, self.warnings, self.stats)
    }
}
