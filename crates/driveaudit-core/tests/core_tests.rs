use driveaudit_core::{
    AuditConfig, AuditError, AuditStats, ItemId, Node, Permission, PermissionKind, RemoteItem,
    Resolution, ResolutionState, Resolved, Role,
};

#[test]
fn test_item_id_operations() {
    let id1 = ItemId::new("0B4aSdoErkE3v");
    let id2 = ItemId::from("0B4aSdoErkE3v");

    assert_eq!(id1, id2);
    assert_eq!(id1.as_str(), "0B4aSdoErkE3v");
    assert_eq!(id1.to_string(), "0B4aSdoErkE3v");
}

#[test]
fn test_remote_item_builders() {
    let item = RemoteItem::file("f1", "notes.txt")
        .with_parent("d1")
        .with_size(2048)
        .with_owner("Ada")
        .with_space("drive")
        .shared(true);

    assert!(!item.is_folder());
    assert_eq!(item.first_parent(), Some(&ItemId::from("d1")));
    assert!(!item.has_multiple_parents());
    assert_eq!(item.size_or_zero(), 2048);
    assert!(item.is_owned_by("Ada"));
    assert!(!item.is_owned_by("Bob"));
    assert!(item.in_space("drive"));
    assert!(!item.in_space("photos"));
    assert_eq!(item.owner_display_names(), vec!["Ada".to_string()]);
}

#[test]
fn test_undeclared_size_defaults_to_zero() {
    let doc = RemoteItem::file("doc", "Spreadsheet");
    assert_eq!(doc.size, None);
    assert_eq!(doc.size_or_zero(), 0);
}

#[test]
fn test_permission_json_roundtrip_keeps_type_tag() {
    let perms = vec![
        Permission::user("ada@example.com").with_role("owner"),
        Permission::anyone().with_role("reader"),
        Permission::domain("example.com"),
        Permission::group("team@example.com"),
    ];
    let json = serde_json::to_string(&perms).unwrap();
    assert!(json.contains("\"type\":\"anyone\""));

    let parsed: Vec<Permission> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, perms);
    assert_eq!(parsed[2].kind, PermissionKind::Domain);
}

#[test]
fn test_node_lifecycle() {
    let mut parent = Node::new(ItemId::from("root"));
    let mut child = Node::new(ItemId::from("docs"));

    child
        .resolve(Resolved {
            name: "Docs".into(),
            parent: Some(ItemId::from("root")),
            role: Role::Ordinary,
            url: Some("https://example.com/docs".into()),
            owners: vec!["Ada".into()],
        })
        .unwrap();
    parent.record_child(0);
    parent.link_child(child.id().clone());

    assert_eq!(child.state(), ResolutionState::Resolved);
    assert_eq!(child.parent(), Some(&ItemId::from("root")));
    assert_eq!(child.url(), Some("https://example.com/docs"));
    assert_eq!(child.owners(), &["Ada".to_string()]);
    assert_eq!(parent.direct_child_count(), 1);
    assert!(parent.child_nodes().contains(&ItemId::from("docs")));
    assert!(parent.is_unresolved());
}

#[test]
fn test_failed_node_serializes_state() {
    let mut node = Node::new(ItemId::from("gone"));
    node.fail("unreachable", "Item not found: gone").unwrap();

    assert!(matches!(node.resolution(), Resolution::Failed { .. }));
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["resolution"]["state"], "failed");
    assert_eq!(json["cached_path"], ".../unreachable");
}

#[test]
fn test_double_resolution_is_invariant_violation() {
    let mut node = Node::new(ItemId::from("a"));
    node.fail("unreachable", "denied").unwrap();
    let err = node.fail("unreachable", "denied").unwrap_err();

    assert!(err.is_invariant_violation());
    assert!(matches!(
        err,
        AuditError::AlreadyResolved {
            state: ResolutionState::ResolutionFailed,
            ..
        }
    ));
}

#[test]
fn test_audit_config_defaults() {
    let config = AuditConfig::default();
    assert_eq!(config.primary_user, "");
    assert_eq!(config.root_names, vec!["My Drive".to_string()]);
    assert_eq!(config.orphan_prefix, "0_orphan");
    assert_eq!(config.large_file_threshold, 100_000_000);
    assert_eq!(config.permission_fetch_attempts, 5);
    assert_eq!(config.lazy_fetch_attempts, 1);
    assert!(!config.enforce_sharing_model);
    assert!(config.validate().is_ok());

    let path = AuditConfig::default_path();
    if let Some(path) = path {
        assert!(path.ends_with("driveaudit/config.toml"));
    }
}

#[test]
fn test_audit_stats_accumulate() {
    let mut stats = AuditStats::new();
    stats.record_item(false, 10);
    stats.record_item(false, 20);
    stats.record_item(true, 0);

    assert_eq!(stats.items_recorded, 3);
    assert_eq!(stats.files_recorded, 2);
    assert_eq!(stats.folders_recorded, 1);
    assert_eq!(stats.total_size, 30);
}
