//! Node registry: the id -> node arena and the algorithms over it.
//!
//! Nodes refer to each other by [`ItemId`] only. Parent links come from the
//! first declared parent of each record; the registry never removes a node
//! once created. Path and aggregate computations walk the arena iteratively,
//! so deep trees do not grow the call stack and cyclic parent data is
//! reported as [`AuditError::ParentCycle`] instead of looping.

use std::collections::HashSet;

use driveaudit_core::{
    AuditConfig, AuditError, AuditWarning, ItemId, Node, RemoteItem, Resolved, Role, WarningKind,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AuditContext;
use crate::store::fetch_with_retry;

/// Arena of folder nodes keyed by item id, in first-reference order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRegistry {
    nodes: IndexMap<ItemId, Node>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &Node)> {
        self.nodes.iter()
    }

    /// Return the node for `id`, creating an unresolved one if absent.
    pub fn get_or_create(&mut self, id: &ItemId) -> &mut Node {
        self.nodes
            .entry(id.clone())
            .or_insert_with(|| Node::new(id.clone()))
    }

    /// Non-creating lookup. `None` means the id was never referenced.
    pub fn lookup(&self, id: &ItemId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn node(&self, id: &ItemId) -> Result<&Node, AuditError> {
        self.nodes
            .get(id)
            .ok_or_else(|| AuditError::UnknownNode { id: id.clone() })
    }

    fn node_mut(&mut self, id: &ItemId) -> Result<&mut Node, AuditError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| AuditError::UnknownNode { id: id.clone() })
    }

    /// Record one enumerated item.
    ///
    /// Counts the item in its parent, resolves its node if it is a folder and
    /// hands it to the classifier. Malformed records only produce warnings.
    pub fn record(&mut self, item: RemoteItem, cx: &mut AuditContext<'_>) -> Result<(), AuditError> {
        if item.is_folder() && self.lookup(&item.id).is_some_and(|node| !node.is_unresolved()) {
            cx.warn(AuditWarning::new(
                Some(item.id.clone()),
                format!("Folder {} recorded twice; ignoring the repeat", item.name),
                WarningKind::DuplicateItem,
            ));
            return Ok(());
        }

        cx.stats_mut().record_item(item.is_folder(), item.size_or_zero());
        for warning in cx.classifier().diagnose(&item) {
            cx.warn(warning);
        }
        let parent = self.attach(&item, item.is_folder(), cx.config())?;
        cx.track(item, parent)
    }

    /// Count `item` in its honored parent and, for nodes, resolve and link.
    fn attach(
        &mut self,
        item: &RemoteItem,
        as_node: bool,
        config: &AuditConfig,
    ) -> Result<Option<ItemId>, AuditError> {
        let parent = item.first_parent().cloned();
        if let Some(parent_id) = &parent {
            self.get_or_create(parent_id).record_child(item.size_or_zero());
        }

        if as_node {
            let role = Role::derive(parent.is_some(), config.is_root_name(&item.name));
            self.get_or_create(&item.id).resolve(Resolved {
                name: item.name.as_str().into(),
                parent: parent.clone(),
                role,
                url: item.url.clone(),
                owners: item.owner_display_names(),
            })?;
            if let Some(parent_id) = &parent {
                self.get_or_create(parent_id).link_child(item.id.clone());
            }
        }

        Ok(parent)
    }

    /// Resolve a node that has only been referenced as a parent.
    ///
    /// A no-op for nodes that are already resolved or failed. On success
    /// the fetched record is attached exactly like an enumerated one,
    /// including counting it in its newly discovered parent. On failure the
    /// node takes the unreachable sentinel name and a fixed path.
    pub fn ensure_resolved(&mut self, id: &ItemId, cx: &mut AuditContext<'_>) -> Result<(), AuditError> {
        if !self.node(id)?.is_unresolved() {
            return Ok(());
        }

        let store = cx.store();
        let outcome = fetch_with_retry(cx.config().lazy_fetch_attempts, || store.fetch_item(id));
        cx.stats_mut().record_lookup(outcome.result.is_ok());

        match outcome.result {
            Ok(mut item) => {
                debug!(id = %id, name = %item.name, "lazily resolved folder");
                item.id = id.clone();
                for warning in cx.classifier().diagnose(&item) {
                    cx.warn(warning);
                }
                let parent = self.attach(&item, true, cx.config())?;
                cx.track(item, parent)
            }
            Err(err) => {
                let name = cx.config().unreachable_name.clone();
                self.node_mut(id)?.fail(name, err.to_string())?;
                cx.warn(AuditWarning::lookup_failed(id, &err));
                Ok(())
            }
        }
    }

    /// Full path of a node, resolving ancestors on demand.
    ///
    /// Every node on the walk gets its path cached, so later calls for any
    /// of them return without touching the store.
    pub fn path(&mut self, id: &ItemId, cx: &mut AuditContext<'_>) -> Result<String, AuditError> {
        let mut pending: Vec<(ItemId, String)> = Vec::new();
        let mut visited: HashSet<ItemId> = HashSet::new();
        let mut current = id.clone();

        let mut path = loop {
            if !visited.insert(current.clone()) {
                return Err(AuditError::ParentCycle { id: current });
            }
            if let Some(cached) = self.node(&current)?.cached_path() {
                break cached.to_string();
            }

            self.ensure_resolved(&current, cx)?;
            let node = self.node(&current)?;
            if let Some(cached) = node.cached_path() {
                break cached.to_string();
            }

            let name = node.name().to_string();
            match (node.parent().cloned(), node.role()) {
                (Some(parent), _) => {
                    pending.push((current, name));
                    current = parent;
                }
                (None, Some(Role::Root)) => {
                    break self.node_mut(&current)?.cache_path(name).to_string();
                }
                (None, Some(Role::Orphan)) => {
                    let orphan_path = format!("{}/{name}", cx.config().orphan_prefix);
                    break self.node_mut(&current)?.cache_path(orphan_path).to_string();
                }
                (None, _) => return Err(AuditError::Unanchored { id: current }),
            }
        };

        while let Some((child, name)) = pending.pop() {
            path = self
                .node_mut(&child)?
                .cache_path(format!("{path}/{name}"))
                .to_string();
        }
        Ok(path)
    }

    /// Resolve the path of every node, including nodes discovered while
    /// resolving, and record the deepest depth.
    pub fn resolve_all_paths(&mut self, cx: &mut AuditContext<'_>) -> Result<(), AuditError> {
        let mut index = 0;
        while let Some(id) = self.nodes.get_index(index).map(|(id, _)| id.clone()) {
            self.path(&id, cx)?;
            index += 1;
        }

        for id in self.nodes.keys() {
            let depth = self.depth(id)?;
            cx.stats_mut().record_depth(depth);
        }
        Ok(())
    }

    /// Cached path, if it has been computed.
    pub fn resolved_path(&self, id: &ItemId) -> Option<&str> {
        self.lookup(id).and_then(Node::cached_path)
    }

    /// Number of ancestors above a node within the known tree.
    pub fn depth(&self, id: &ItemId) -> Result<u32, AuditError> {
        let mut visited: HashSet<&ItemId> = HashSet::new();
        let mut node = self.node(id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent() {
            if !visited.insert(node.id()) {
                return Err(AuditError::ParentCycle {
                    id: node.id().clone(),
                });
            }
            node = self.node(parent)?;
            depth += 1;
        }
        Ok(depth)
    }

    fn cached_aggregate(&self, id: &ItemId) -> Option<(u64, u64)> {
        let node = self.lookup(id)?;
        node.cached_descendant_count()
            .zip(node.cached_descendant_size())
    }

    /// Transitive item count and size below a node.
    ///
    /// Post-order over the child links; subtrees that are already cached
    /// are not walked again.
    pub fn descendants(&mut self, id: &ItemId) -> Result<(u64, u64), AuditError> {
        let mut stack: Vec<(ItemId, bool)> = vec![(id.clone(), false)];
        let mut on_path: HashSet<ItemId> = HashSet::new();

        while let Some((current, expanded)) = stack.pop() {
            if self.cached_aggregate(&current).is_some() {
                continue;
            }
            let node = self.node(&current)?;

            if expanded {
                let mut count = node.direct_child_count();
                let mut size = node.direct_child_size();
                for child in node.child_nodes() {
                    let (child_count, child_size) = self
                        .cached_aggregate(child)
                        .ok_or_else(|| AuditError::ParentCycle { id: child.clone() })?;
                    count += child_count;
                    size = size.saturating_add(child_size);
                }
                on_path.remove(&current);
                self.node_mut(&current)?.cache_descendants(count, size);
                continue;
            }

            let children: Vec<ItemId> = node.child_nodes().iter().cloned().collect();
            on_path.insert(current.clone());
            stack.push((current, true));
            for child in children {
                if on_path.contains(&child) {
                    return Err(AuditError::ParentCycle { id: child });
                }
                if self.cached_aggregate(&child).is_none() {
                    stack.push((child, false));
                }
            }
        }

        self.cached_aggregate(id)
            .ok_or_else(|| AuditError::UnknownNode { id: id.clone() })
    }

    pub fn descendant_count(&mut self, id: &ItemId) -> Result<u64, AuditError> {
        Ok(self.descendants(id)?.0)
    }

    pub fn descendant_size(&mut self, id: &ItemId) -> Result<u64, AuditError> {
        Ok(self.descendants(id)?.1)
    }

    /// Aggregate every node.
    pub fn aggregate_all(&mut self) -> Result<(), AuditError> {
        let ids: Vec<ItemId> = self.nodes.keys().cloned().collect();
        for id in &ids {
            self.descendants(id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RemoteStore;
    use driveaudit_core::{FetchError, Permission, ResolutionState};

    struct EmptyStore;

    impl RemoteStore for EmptyStore {
        fn fetch_item(&self, id: &ItemId) -> Result<RemoteItem, FetchError> {
            Err(FetchError::NotFound { id: id.clone() })
        }

        fn fetch_permissions(&self, id: &ItemId) -> Result<Vec<Permission>, FetchError> {
            Err(FetchError::NotFound { id: id.clone() })
        }
    }

    fn config() -> AuditConfig {
        AuditConfig::builder()
            .primary_user("Ada")
            .root_names(vec!["Root".to_string()])
            .build()
            .unwrap()
    }

    fn folder(id: &str, name: &str, parent: Option<&str>) -> RemoteItem {
        let item = RemoteItem::folder(id, name).with_owner("Ada");
        match parent {
            Some(parent) => item.with_parent(parent),
            None => item,
        }
    }

    #[test]
    fn test_get_or_create_and_lookup() {
        let mut registry = NodeRegistry::new();
        let id = ItemId::from("a");
        assert!(registry.lookup(&id).is_none());

        registry.get_or_create(&id).record_child(5);
        registry.get_or_create(&id).record_child(7);

        let node = registry.lookup(&id).unwrap();
        assert_eq!(node.state(), ResolutionState::Unresolved);
        assert_eq!(node.direct_child_count(), 2);
        assert_eq!(node.direct_child_size(), 12);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_record_links_folder_children_only() {
        let config = config();
        let store = EmptyStore;
        let mut cx = AuditContext::new(&config, &store);
        let mut registry = NodeRegistry::new();

        registry.record(folder("root", "Root", None), &mut cx).unwrap();
        registry.record(folder("sub", "Sub", Some("root")), &mut cx).unwrap();
        registry
            .record(
                RemoteItem::file("f", "f.txt").with_parent("root").with_owner("Ada").with_size(3),
                &mut cx,
            )
            .unwrap();

        let root = registry.lookup(&"root".into()).unwrap();
        assert_eq!(root.direct_child_count(), 2);
        assert_eq!(root.direct_child_size(), 3);
        assert_eq!(root.child_nodes().len(), 1);
        assert_eq!(root.role(), Some(Role::Root));
        assert!(registry.lookup(&"f".into()).is_none());
    }

    #[test]
    fn test_repeated_folder_record_is_ignored() {
        let config = config();
        let store = EmptyStore;
        let mut cx = AuditContext::new(&config, &store);
        let mut registry = NodeRegistry::new();

        registry.record(folder("root", "Root", None), &mut cx).unwrap();
        registry.record(folder("sub", "Sub", Some("root")), &mut cx).unwrap();
        registry.record(folder("sub", "Sub", Some("root")), &mut cx).unwrap();

        assert_eq!(registry.lookup(&"root".into()).unwrap().direct_child_count(), 1);
        assert_eq!(cx.warnings()[0].kind, WarningKind::DuplicateItem);
    }

    #[test]
    fn test_path_caches_every_ancestor() {
        let config = config();
        let store = EmptyStore;
        let mut cx = AuditContext::new(&config, &store);
        let mut registry = NodeRegistry::new();

        registry.record(folder("c", "C", Some("b")), &mut cx).unwrap();
        registry.record(folder("b", "B", Some("a")), &mut cx).unwrap();
        registry.record(folder("a", "Root", None), &mut cx).unwrap();

        assert_eq!(registry.path(&"c".into(), &mut cx).unwrap(), "Root/B/C");
        assert_eq!(registry.resolved_path(&"b".into()), Some("Root/B"));
        assert_eq!(registry.resolved_path(&"a".into()), Some("Root"));
        assert_eq!(registry.depth(&"c".into()).unwrap(), 2);
    }

    #[test]
    fn test_orphan_path_uses_prefix() {
        let config = config();
        let store = EmptyStore;
        let mut cx = AuditContext::new(&config, &store);
        let mut registry = NodeRegistry::new();

        registry.record(folder("s", "Shared with me", None), &mut cx).unwrap();
        assert_eq!(
            registry.path(&"s".into(), &mut cx).unwrap(),
            "0_orphan/Shared with me"
        );
        assert_eq!(registry.lookup(&"s".into()).unwrap().role(), Some(Role::Orphan));
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let config = config();
        let store = EmptyStore;
        let mut cx = AuditContext::new(&config, &store);
        let mut registry = NodeRegistry::new();

        registry.record(folder("x", "X", Some("x")), &mut cx).unwrap();
        assert!(matches!(
            registry.path(&"x".into(), &mut cx),
            Err(AuditError::ParentCycle { .. })
        ));
        assert!(matches!(
            registry.descendants(&"x".into()),
            Err(AuditError::ParentCycle { .. })
        ));
        assert!(registry.depth(&"x".into()).is_err());
    }

    #[test]
    fn test_aggregates_are_additive() {
        let config = config();
        let store = EmptyStore;
        let mut cx = AuditContext::new(&config, &store);
        let mut registry = NodeRegistry::new();

        registry.record(folder("r", "Root", None), &mut cx).unwrap();
        registry.record(folder("a", "A", Some("r")), &mut cx).unwrap();
        registry.record(folder("b", "B", Some("r")), &mut cx).unwrap();
        for (i, parent) in ["a", "a", "b", "r"].iter().enumerate() {
            let file = RemoteItem::file(format!("f{i}").as_str(), "f")
                .with_parent(*parent)
                .with_owner("Ada")
                .with_size(10);
            registry.record(file, &mut cx).unwrap();
        }

        registry.aggregate_all().unwrap();
        let root = ItemId::from("r");
        let children: Vec<ItemId> = registry
            .lookup(&root)
            .unwrap()
            .child_nodes()
            .iter()
            .cloned()
            .collect();
        let mut expected = registry.lookup(&root).unwrap().direct_child_count();
        for child in &children {
            expected += registry.descendant_count(child).unwrap();
        }

        assert_eq!(registry.descendant_count(&root).unwrap(), expected);
        assert_eq!(expected, 6);
        assert_eq!(registry.descendant_size(&root).unwrap(), 40);
    }

    #[test]
    fn test_ancestor_reuses_cached_subtree() {
        let config = config();
        let store = EmptyStore;
        let mut cx = AuditContext::new(&config, &store);
        let mut registry = NodeRegistry::new();
        let file = |id: &str, parent: &str, size: u64| {
            RemoteItem::file(id, id)
                .with_parent(parent)
                .with_owner("Ada")
                .with_size(size)
        };

        registry.record(folder("r", "Root", None), &mut cx).unwrap();
        registry.record(folder("m", "Mid", Some("r")), &mut cx).unwrap();
        registry.record(folder("l", "Leaf", Some("m")), &mut cx).unwrap();
        registry.record(file("f0", "l", 10), &mut cx).unwrap();
        registry.record(file("f1", "m", 5), &mut cx).unwrap();
        registry.record(file("f2", "r", 1), &mut cx).unwrap();

        let mid = registry.descendants(&"m".into()).unwrap();
        assert_eq!(mid, (3, 15));

        // Counted after the subtree was cached; only a re-walk would see it.
        registry.record(file("late", "m", 100), &mut cx).unwrap();
        assert_eq!(registry.lookup(&"m".into()).unwrap().direct_child_count(), 3);

        assert_eq!(registry.descendants(&"r".into()).unwrap(), (2 + mid.0, 1 + mid.1));
        assert_eq!(registry.descendants(&"m".into()).unwrap(), mid);
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        let mut registry = NodeRegistry::new();
        assert!(matches!(
            registry.descendants(&"nope".into()),
            Err(AuditError::UnknownNode { .. })
        ));
    }
}
