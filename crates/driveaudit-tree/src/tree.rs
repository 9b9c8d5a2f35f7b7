//! Finished audit output.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use driveaudit_core::{
    AuditConfig, AuditError, AuditStats, AuditWarning, ItemId, Node, Role, WarningKind,
};
use serde::{Deserialize, Serialize};

use crate::classifier::TrackedItem;
use crate::context::TrackedItems;
use crate::registry::NodeRegistry;

/// A completed audit: every node has its path and aggregates cached, so the
/// tree can be reported or serialized without store access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTree {
    /// All folder nodes.
    pub registry: NodeRegistry,

    /// Flagged items keyed by id.
    pub tracked: TrackedItems,

    /// When this audit was performed.
    pub audited_at: DateTime<Utc>,

    /// Duration of the audit.
    pub audit_duration: Duration,

    /// Configuration used.
    pub config: AuditConfig,

    /// Summary statistics.
    pub stats: AuditStats,

    /// Warnings recorded during the audit.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTree {
    /// Assemble a finished audit.
    pub fn new(
        registry: NodeRegistry,
        tracked: TrackedItems,
        config: AuditConfig,
        stats: AuditStats,
        audit_duration: Duration,
        warnings: Vec<AuditWarning>,
    ) -> Self {
        Self {
            registry,
            tracked,
            audited_at: Utc::now(),
            audit_duration,
            config,
            stats,
            warnings,
        }
    }

    /// Read an audit previously written out as JSON. Reports over the loaded
    /// tree need no store access.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let text = std::fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| AuditError::parse(path, e))
    }

    /// Full path of a tracked item.
    pub fn tracked_path(&self, item: &TrackedItem) -> Option<String> {
        item.full_path(&self.registry, &self.config)
    }

    /// Look up a tracked item by id.
    pub fn tracked_item(&self, id: &ItemId) -> Option<&TrackedItem> {
        self.tracked.get(id)
    }

    /// Nodes with the given role.
    pub fn nodes_with_role(&self, role: Role) -> impl Iterator<Item = &Node> {
        self.registry
            .iter()
            .map(|(_, node)| node)
            .filter(move |node| node.role() == Some(role))
    }

    /// Nodes whose lazy lookup failed.
    pub fn unreachable_nodes(&self) -> impl Iterator<Item = &Node> {
        self.registry
            .iter()
            .map(|(_, node)| node)
            .filter(|node| node.is_failed())
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &AuditWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
