//! Item classification against the audit predicates.
//!
//! [`Classifier::classify`] is a pure function of an item, its honored
//! parent and the configuration. Items with no flag set are dropped so that
//! memory stays bounded on large stores. Shared items owned by the primary
//! user are later enriched with their permission list; items owned by
//! someone else are shared by definition and never fetched.

use driveaudit_core::{
    AuditConfig, AuditError, AuditWarning, ItemId, Permission, PermissionKind, RemoteItem,
    WarningKind,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::registry::NodeRegistry;

/// One audit predicate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Flag {
    Shared,
    SpacesPhoto,
    SpacesApp,
    Trashed,
    MultiOwners,
    NotOwnedByUser,
    Orphan,
    MultipleParents,
    LargeFile,
}

/// The boolean attribute set of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags {
    pub shared: bool,
    pub spaces_photo: bool,
    pub spaces_app: bool,
    pub trashed: bool,
    pub multi_owners: bool,
    pub not_owned_by_user: bool,
    pub orphan: bool,
    pub multiple_parents: bool,
    pub large_file: bool,
}

impl ItemFlags {
    /// Value of a single flag.
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Shared => self.shared,
            Flag::SpacesPhoto => self.spaces_photo,
            Flag::SpacesApp => self.spaces_app,
            Flag::Trashed => self.trashed,
            Flag::MultiOwners => self.multi_owners,
            Flag::NotOwnedByUser => self.not_owned_by_user,
            Flag::Orphan => self.orphan,
            Flag::MultipleParents => self.multiple_parents,
            Flag::LargeFile => self.large_file,
        }
    }

    /// Check whether any flag is set.
    pub fn any(&self) -> bool {
        Flag::iter().any(|flag| self.get(flag))
    }

    /// All set flags, in declaration order.
    pub fn set_flags(&self) -> Vec<Flag> {
        Flag::iter().filter(|flag| self.get(*flag)).collect()
    }
}

/// Attributes derived from an item's permission list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingDetail {
    /// Whether the permission list was fetched successfully.
    pub fetched: bool,
    pub more_than_one_permission: bool,
    /// A domain- or group-scoped grant exists.
    pub non_user_or_anyone_permission: bool,
    /// An anyone-with-link grant exists.
    pub link_sharing: bool,
    /// Users, groups and domains with access.
    pub users_domains_groups_with_access: Vec<String>,
}

impl SharingDetail {
    /// Derive sharing attributes from a permission list.
    pub fn from_permissions(permissions: &[Permission]) -> Self {
        Self {
            fetched: true,
            more_than_one_permission: permissions.len() > 1,
            non_user_or_anyone_permission: permissions
                .iter()
                .any(|p| matches!(p.kind, PermissionKind::Domain | PermissionKind::Group)),
            link_sharing: permissions.iter().any(|p| p.kind == PermissionKind::Anyone),
            users_domains_groups_with_access: permissions
                .iter()
                .filter_map(|p| p.grantee().map(str::to_string))
                .collect(),
        }
    }

    /// Verify the store's sharing guarantees against the derived attributes.
    pub fn check_model(&self, id: &ItemId, shared: bool) -> Result<(), AuditError> {
        let violation = |detail: &str| AuditError::SharingModel {
            id: id.clone(),
            detail: detail.to_string(),
        };
        if self.non_user_or_anyone_permission && !(self.more_than_one_permission && shared) {
            return Err(violation(
                "domain/group grant without multiple permissions or shared flag",
            ));
        }
        if (self.more_than_one_permission || self.non_user_or_anyone_permission || self.link_sharing)
            && !shared
        {
            return Err(violation("permissions imply sharing but item is not shared"));
        }
        if self.link_sharing && !(self.more_than_one_permission && self.non_user_or_anyone_permission)
        {
            return Err(violation(
                "link sharing without multiple permissions and a domain/group grant",
            ));
        }
        Ok(())
    }
}

/// An item flagged by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedItem {
    /// The raw record.
    pub item: RemoteItem,
    /// Derived attributes.
    pub flags: ItemFlags,
    /// Honored parent folder, if any.
    pub parent: Option<ItemId>,
    /// Sharing detail; defaults unless enrichment succeeded.
    pub sharing: SharingDetail,
}

impl TrackedItem {
    pub fn id(&self) -> &ItemId {
        &self.item.id
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }

    /// Shared and owned by the primary user.
    pub fn needs_enrichment(&self) -> bool {
        self.flags.shared && !self.flags.not_owned_by_user
    }

    /// Full path through the parent folder's resolved path.
    ///
    /// Returns `None` if the parent's path has not been resolved yet.
    pub fn full_path(&self, registry: &NodeRegistry, config: &AuditConfig) -> Option<String> {
        match &self.parent {
            Some(parent) => registry
                .resolved_path(parent)
                .map(|path| format!("{path}/{}", self.item.name)),
            None if config.is_root_name(&self.item.name) => Some(self.item.name.clone()),
            None => Some(format!("{}/{}", config.orphan_prefix, self.item.name)),
        }
    }
}

/// Maps raw items to tracked items.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    config: &'a AuditConfig,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over a configuration.
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    /// Evaluate every predicate.
    pub fn flags(&self, item: &RemoteItem, parent: Option<&ItemId>) -> ItemFlags {
        let config = self.config;
        ItemFlags {
            shared: item.shared,
            spaces_photo: item.in_space(&config.photo_space),
            spaces_app: item.in_space(&config.app_space),
            trashed: item.trashed,
            multi_owners: item.owners.len() > 1,
            not_owned_by_user: !item.is_owned_by(&config.primary_user),
            orphan: parent.is_none()
                && !(config.is_root_name(&item.name) && item.parents.is_empty()),
            multiple_parents: item.has_multiple_parents(),
            large_file: item.size_or_zero() > config.large_file_threshold,
        }
    }

    /// Classify an item; `None` when no predicate holds.
    pub fn classify(&self, item: RemoteItem, parent: Option<ItemId>) -> Option<TrackedItem> {
        let flags = self.flags(&item, parent.as_ref());
        if !flags.any() {
            return None;
        }
        Some(TrackedItem {
            item,
            flags,
            parent,
            sharing: SharingDetail::default(),
        })
    }

    /// Malformed-input diagnostics for a record.
    pub fn diagnose(&self, item: &RemoteItem) -> Vec<AuditWarning> {
        let mut warnings = Vec::new();
        if item.has_multiple_parents() {
            warnings.push(AuditWarning::multiple_parents(
                &item.id,
                &item.name,
                item.parents.len(),
            ));
        }
        if item.owners.len() != item.owner_names.len() {
            warnings.push(AuditWarning::new(
                Some(item.id.clone()),
                format!(
                    "{} has {} owners but {} owner names",
                    item.name,
                    item.owners.len(),
                    item.owner_names.len()
                ),
                WarningKind::OwnerCountMismatch,
            ));
        }
        if item.name.is_empty() {
            warnings.push(AuditWarning::new(
                Some(item.id.clone()),
                "Item has no name",
                WarningKind::MissingField,
            ));
        }
        if item.mime_type.is_empty() {
            warnings.push(AuditWarning::new(
                Some(item.id.clone()),
                "Item has no type tag; treated as a non-folder",
                WarningKind::MissingField,
            ));
        }
        warnings
    }
}
