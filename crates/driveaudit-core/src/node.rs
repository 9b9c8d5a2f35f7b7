//! Folder nodes and their resolution state machine.

use compact_str::CompactString;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::AuditError;
use crate::item::ItemId;

/// Position of a parentless node relative to the visible tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Has a parent.
    Ordinary,
    /// No parent, and named like a recognized top-level container.
    Root,
    /// No parent, and not a recognized top-level container.
    Orphan,
}

impl Role {
    /// Derive the role of a freshly resolved node.
    pub fn derive(has_parent: bool, is_root_name: bool) -> Self {
        match (has_parent, is_root_name) {
            (true, _) => Role::Ordinary,
            (false, true) => Role::Root,
            (false, false) => Role::Orphan,
        }
    }
}

/// Discriminant of [`Resolution`], for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionState {
    Unresolved,
    Resolved,
    ResolutionFailed,
}

/// Metadata a node carries once its backing item is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    /// Display name.
    pub name: CompactString,
    /// Honored parent, if any.
    pub parent: Option<ItemId>,
    /// Role within the tree.
    pub role: Role,
    /// Browser link.
    pub url: Option<String>,
    /// Owner display names.
    pub owners: Vec<String>,
}

/// Resolution state of a node. Moves forward only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    /// Only ever referenced as someone's parent.
    Unresolved,
    /// Backing item known.
    Resolved(Resolved),
    /// Lazy lookup failed; the node carries a sentinel name.
    Failed {
        name: CompactString,
        reason: String,
    },
}

/// One folder-type item, keyed by id in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: ItemId,
    resolution: Resolution,
    direct_child_count: u64,
    direct_child_size: u64,
    child_nodes: IndexSet<ItemId>,
    cached_path: Option<String>,
    cached_descendant_count: Option<u64>,
    cached_descendant_size: Option<u64>,
}

impl Node {
    /// Create an unresolved node with zero counters and no links.
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            resolution: Resolution::Unresolved,
            direct_child_count: 0,
            direct_child_size: 0,
            child_nodes: IndexSet::new(),
            cached_path: None,
            cached_descendant_count: None,
            cached_descendant_size: None,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Current state discriminant.
    pub fn state(&self) -> ResolutionState {
        match self.resolution {
            Resolution::Unresolved => ResolutionState::Unresolved,
            Resolution::Resolved(_) => ResolutionState::Resolved,
            Resolution::Failed { .. } => ResolutionState::ResolutionFailed,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.resolution, Resolution::Unresolved)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.resolution, Resolution::Failed { .. })
    }

    /// Display name; empty while unresolved.
    pub fn name(&self) -> &str {
        match &self.resolution {
            Resolution::Unresolved => "",
            Resolution::Resolved(r) => r.name.as_str(),
            Resolution::Failed { name, .. } => name.as_str(),
        }
    }

    /// Honored parent. Always `None` unless resolved.
    pub fn parent(&self) -> Option<&ItemId> {
        match &self.resolution {
            Resolution::Resolved(r) => r.parent.as_ref(),
            _ => None,
        }
    }

    /// Role; only determined once resolved.
    pub fn role(&self) -> Option<Role> {
        match &self.resolution {
            Resolution::Resolved(r) => Some(r.role),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Resolved(r) => r.url.as_deref(),
            _ => None,
        }
    }

    pub fn owners(&self) -> &[String] {
        match &self.resolution {
            Resolution::Resolved(r) => &r.owners,
            _ => &[],
        }
    }

    pub fn direct_child_count(&self) -> u64 {
        self.direct_child_count
    }

    pub fn direct_child_size(&self) -> u64 {
        self.direct_child_size
    }

    /// Folder children linked to this node.
    pub fn child_nodes(&self) -> &IndexSet<ItemId> {
        &self.child_nodes
    }

    pub fn cached_path(&self) -> Option<&str> {
        self.cached_path.as_deref()
    }

    pub fn cached_descendant_count(&self) -> Option<u64> {
        self.cached_descendant_count
    }

    pub fn cached_descendant_size(&self) -> Option<u64> {
        self.cached_descendant_size
    }

    /// Count one enclosed item of the given size.
    pub fn record_child(&mut self, size: u64) {
        self.direct_child_count += 1;
        self.direct_child_size = self.direct_child_size.saturating_add(size);
    }

    /// Link a folder child. Returns false if it was already linked.
    pub fn link_child(&mut self, child: ItemId) -> bool {
        self.child_nodes.insert(child)
    }

    /// Transition `unresolved -> resolved`.
    pub fn resolve(&mut self, resolved: Resolved) -> Result<(), AuditError> {
        if !self.is_unresolved() {
            return Err(AuditError::AlreadyResolved {
                id: self.id.clone(),
                state: self.state(),
            });
        }
        self.resolution = Resolution::Resolved(resolved);
        Ok(())
    }

    /// Transition `unresolved -> resolution_failed`, fixing the path to
    /// `".../" + name`.
    pub fn fail(&mut self, name: impl Into<CompactString>, reason: impl Into<String>) -> Result<(), AuditError> {
        if !self.is_unresolved() {
            return Err(AuditError::AlreadyResolved {
                id: self.id.clone(),
                state: self.state(),
            });
        }
        let name = name.into();
        self.cached_path = Some(format!(".../{name}"));
        self.resolution = Resolution::Failed {
            name,
            reason: reason.into(),
        };
        Ok(())
    }

    /// Store the computed path. Write-once; a second write keeps the first
    /// value and returns it.
    pub fn cache_path(&mut self, path: String) -> &str {
        self.cached_path.get_or_insert(path)
    }

    /// Store computed aggregates. Write-once, like [`Node::cache_path`].
    pub fn cache_descendants(&mut self, count: u64, size: u64) -> (u64, u64) {
        let count = *self.cached_descendant_count.get_or_insert(count);
        let size = *self.cached_descendant_size.get_or_insert(size);
        (count, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(name: &str, parent: Option<&str>, role: Role) -> Resolved {
        Resolved {
            name: name.into(),
            parent: parent.map(ItemId::from),
            role,
            url: None,
            owners: Vec::new(),
        }
    }

    #[test]
    fn test_new_node_is_unresolved() {
        let node = Node::new(ItemId::from("a"));
        assert_eq!(node.state(), ResolutionState::Unresolved);
        assert_eq!(node.name(), "");
        assert!(node.parent().is_none());
        assert!(node.role().is_none());
        assert_eq!(node.cached_descendant_count(), None);
    }

    #[test]
    fn test_resolve_only_once() {
        let mut node = Node::new(ItemId::from("a"));
        node.resolve(resolved("A", None, Role::Root)).unwrap();
        assert_eq!(node.role(), Some(Role::Root));

        let err = node.resolve(resolved("A", None, Role::Root)).unwrap_err();
        assert!(matches!(err, AuditError::AlreadyResolved { .. }));
        assert!(node.fail("x", "late").is_err());
    }

    #[test]
    fn test_fail_fixes_path() {
        let mut node = Node::new(ItemId::from("p"));
        node.fail("unreachable", "not found").unwrap();
        assert_eq!(node.state(), ResolutionState::ResolutionFailed);
        assert_eq!(node.cached_path(), Some(".../unreachable"));
        assert!(node.resolve(resolved("P", None, Role::Orphan)).is_err());
    }

    #[test]
    fn test_caches_are_write_once() {
        let mut node = Node::new(ItemId::from("a"));
        assert_eq!(node.cache_path("A".to_string()), "A");
        assert_eq!(node.cache_path("B".to_string()), "A");
        assert_eq!(node.cache_descendants(3, 30), (3, 30));
        assert_eq!(node.cache_descendants(0, 0), (3, 30));
    }

    #[test]
    fn test_counters_and_links() {
        let mut node = Node::new(ItemId::from("a"));
        node.record_child(10);
        node.record_child(0);
        assert_eq!(node.direct_child_count(), 2);
        assert_eq!(node.direct_child_size(), 10);
        assert!(node.link_child(ItemId::from("b")));
        assert!(!node.link_child(ItemId::from("b")));
        assert_eq!(node.child_nodes().len(), 1);
    }

    #[test]
    fn test_role_derivation() {
        assert_eq!(Role::derive(true, true), Role::Ordinary);
        assert_eq!(Role::derive(false, true), Role::Root);
        assert_eq!(Role::derive(false, false), Role::Orphan);
    }
}
