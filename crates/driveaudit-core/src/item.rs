//! Raw item records as returned by the remote store.

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

/// MIME type the store uses to tag folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Stable identifier of a remote item. Never reused within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub CompactString);

impl ItemId {
    /// Create a new ItemId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An owner entry on an item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Human-readable owner name.
    #[serde(default)]
    pub display_name: String,
    /// Owner email, when the store exposes it.
    #[serde(default)]
    pub email_address: Option<String>,
}

impl Owner {
    /// Create an owner with a display name only.
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email_address: None,
        }
    }

    /// Check whether this owner is the given user (by name or email).
    pub fn is(&self, user: &str) -> bool {
        self.display_name == user || self.email_address.as_deref() == Some(user)
    }
}

/// Grantee type of a permission entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionKind {
    /// A specific user account (including the owner).
    User,
    /// A group address.
    Group,
    /// Everyone in a domain.
    Domain,
    /// Anyone holding the link.
    Anyone,
    /// A grantee type this tool does not know about.
    #[serde(other)]
    Unknown,
}

/// A single access grant on an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Grantee type.
    #[serde(rename = "type")]
    pub kind: PermissionKind,
    /// Grantee email for user and group grants.
    #[serde(default)]
    pub email_address: Option<String>,
    /// Grantee domain for domain grants.
    #[serde(default)]
    pub domain: Option<String>,
    /// Access role (owner, writer, reader, ...).
    #[serde(default)]
    pub role: Option<String>,
}

impl Permission {
    /// Create a user permission.
    pub fn user(email: impl Into<String>) -> Self {
        Self {
            kind: PermissionKind::User,
            email_address: Some(email.into()),
            domain: None,
            role: None,
        }
    }

    /// Create a group permission.
    pub fn group(email: impl Into<String>) -> Self {
        Self {
            kind: PermissionKind::Group,
            email_address: Some(email.into()),
            domain: None,
            role: None,
        }
    }

    /// Create a domain permission.
    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            kind: PermissionKind::Domain,
            email_address: None,
            domain: Some(domain.into()),
            role: None,
        }
    }

    /// Create an anyone-with-link permission.
    pub fn anyone() -> Self {
        Self {
            kind: PermissionKind::Anyone,
            email_address: None,
            domain: None,
            role: None,
        }
    }

    /// Set the access role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// The user, group or domain this grant names, if any.
    pub fn grantee(&self) -> Option<&str> {
        match self.kind {
            PermissionKind::User | PermissionKind::Group => self.email_address.as_deref(),
            PermissionKind::Domain => self.domain.as_deref(),
            PermissionKind::Anyone | PermissionKind::Unknown => None,
        }
    }
}

/// One item record from the remote store.
///
/// Every field except `id` defaults when missing so that malformed records
/// can still be processed with a diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    /// Stable identifier.
    pub id: ItemId,

    /// Display name.
    #[serde(default, alias = "title")]
    pub name: String,

    /// Type tag; folders carry [`FOLDER_MIME_TYPE`].
    #[serde(default)]
    pub mime_type: String,

    /// Declared parent ids. Only the first is honored.
    #[serde(default)]
    pub parents: Vec<ItemId>,

    /// Declared size in bytes. Absent for items with no byte representation.
    #[serde(default, alias = "fileSize")]
    pub size: Option<u64>,

    /// Storage-space tags.
    #[serde(default)]
    pub spaces: Vec<String>,

    /// Whether the store marks the item as shared.
    #[serde(default)]
    pub shared: bool,

    /// Whether the item is in the trash.
    #[serde(default)]
    pub trashed: bool,

    /// Owner entries.
    #[serde(default)]
    pub owners: Vec<Owner>,

    /// Owner display names as a separate list.
    #[serde(default)]
    pub owner_names: Vec<String>,

    /// Browser link to the item.
    #[serde(default, alias = "alternateLink")]
    pub url: Option<String>,
}

impl RemoteItem {
    /// Create a non-folder item.
    pub fn file(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: "application/octet-stream".to_string(),
            ..Default::default()
        }
    }

    /// Create a folder item.
    pub fn folder(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            ..Default::default()
        }
    }

    /// Add a declared parent.
    pub fn with_parent(mut self, parent: impl Into<ItemId>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Set the declared size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Add an owner, keeping `owner_names` in step.
    pub fn with_owner(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.owner_names.push(name.clone());
        self.owners.push(Owner::named(name));
        self
    }

    /// Add a storage-space tag.
    pub fn with_space(mut self, space: impl Into<String>) -> Self {
        self.spaces.push(space.into());
        self
    }

    /// Set the shared flag.
    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Set the trashed flag.
    pub fn trashed(mut self, trashed: bool) -> Self {
        self.trashed = trashed;
        self
    }

    /// Check if this item is a folder.
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// The honored parent: the first declared one.
    pub fn first_parent(&self) -> Option<&ItemId> {
        self.parents.first()
    }

    /// Check if the item declares more than one parent.
    pub fn has_multiple_parents(&self) -> bool {
        self.parents.len() > 1
    }

    /// Declared size, or zero when undeclared.
    pub fn size_or_zero(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    /// Check whether the given user is among the owners.
    pub fn is_owned_by(&self, user: &str) -> bool {
        self.owner_names.iter().any(|n| n == user) || self.owners.iter().any(|o| o.is(user))
    }

    /// Check whether the item lives in the given storage space.
    pub fn in_space(&self, space: &str) -> bool {
        self.spaces.iter().any(|s| s == space)
    }

    /// Owner display names, falling back to emails.
    pub fn owner_display_names(&self) -> Vec<String> {
        self.owners
            .iter()
            .map(|o| {
                if o.display_name.is_empty() {
                    o.email_address.clone().unwrap_or_default()
                } else {
                    o.display_name.clone()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_detection() {
        assert!(RemoteItem::folder("a", "A").is_folder());
        assert!(!RemoteItem::file("f", "F").is_folder());
    }

    #[test]
    fn test_first_parent_wins() {
        let item = RemoteItem::file("f", "F").with_parent("X").with_parent("Y");
        assert_eq!(item.first_parent(), Some(&ItemId::from("X")));
        assert!(item.has_multiple_parents());
    }

    #[test]
    fn test_deserialize_store_field_names() {
        let json = r#"{
            "id": "abc",
            "title": "report.pdf",
            "mimeType": "application/pdf",
            "parents": ["root"],
            "fileSize": 42,
            "owners": [{"displayName": "Ada", "emailAddress": "ada@example.com"}],
            "ownerNames": ["Ada"],
            "alternateLink": "https://example.com/abc"
        }"#;
        let item: RemoteItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.name, "report.pdf");
        assert_eq!(item.size, Some(42));
        assert!(item.is_owned_by("ada@example.com"));
        assert!(!item.shared);
        assert_eq!(item.url.as_deref(), Some("https://example.com/abc"));
    }

    #[test]
    fn test_unknown_permission_kind() {
        let perm: Permission = serde_json::from_str(r#"{"type": "audience"}"#).unwrap();
        assert_eq!(perm.kind, PermissionKind::Unknown);
        assert_eq!(perm.grantee(), None);
    }

    #[test]
    fn test_permission_grantee() {
        assert_eq!(Permission::user("a@x.com").grantee(), Some("a@x.com"));
        assert_eq!(Permission::domain("x.com").grantee(), Some("x.com"));
        assert_eq!(Permission::anyone().grantee(), None);
        assert_eq!(PermissionKind::Anyone.to_string(), "anyone");
    }
}
