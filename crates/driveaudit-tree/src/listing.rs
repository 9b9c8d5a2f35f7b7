//! JSON-backed store: an exported listing of a remote drive.
//!
//! ```json
//! {
//!   "items": [ { "id": "...", "name": "...", "mimeType": "...", "parents": ["..."] } ],
//!   "detached": [ ... ],
//!   "permissions": { "<id>": [ { "type": "user", "emailAddress": "..." } ] },
//!   "denied": [ "<id>" ]
//! }
//! ```
//!
//! `items` is the enumeration stream. `detached` items are only reachable by
//! id, like ancestors hidden from enumeration. Ids in `denied` fail every
//! fetch with a permission error.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use driveaudit_core::{AuditError, FetchError, ItemId, Permission, RemoteItem};
use serde::{Deserialize, Serialize};

use crate::store::RemoteStore;

/// On-disk listing format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Listing {
    pub items: Vec<RemoteItem>,
    pub detached: Vec<RemoteItem>,
    pub permissions: HashMap<ItemId, Vec<Permission>>,
    pub denied: Vec<ItemId>,
}

/// A [`RemoteStore`] answering from a [`Listing`].
#[derive(Debug, Clone, Default)]
pub struct ListingStore {
    listing: Listing,
    by_id: HashMap<ItemId, usize>,
    denied: HashSet<ItemId>,
}

impl ListingStore {
    /// Read a listing file.
    pub fn from_path(path: &Path) -> Result<Self, AuditError> {
        let text = std::fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        let listing: Listing = serde_json::from_str(&text).map_err(|e| AuditError::parse(path, e))?;
        Ok(Self::from_listing(listing))
    }

    /// Index an in-memory listing.
    pub fn from_listing(listing: Listing) -> Self {
        // Detached records are indexed last so enumerated ones win on clashes.
        let by_id = listing
            .detached
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), listing.items.len() + i))
            .chain(
                listing
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (item.id.clone(), i)),
            )
            .collect();
        let denied = listing.denied.iter().cloned().collect();
        Self {
            listing,
            by_id,
            denied,
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// The enumeration stream.
    pub fn enumerate(&self) -> impl Iterator<Item = Result<RemoteItem, FetchError>> + '_ {
        self.listing.items.iter().cloned().map(Ok)
    }

    fn record(&self, index: usize) -> Option<&RemoteItem> {
        let enumerated = self.listing.items.len();
        if index < enumerated {
            self.listing.items.get(index)
        } else {
            self.listing.detached.get(index - enumerated)
        }
    }
}

impl RemoteStore for ListingStore {
    fn fetch_item(&self, id: &ItemId) -> Result<RemoteItem, FetchError> {
        if self.denied.contains(id) {
            return Err(FetchError::PermissionDenied { id: id.clone() });
        }
        self.by_id
            .get(id)
            .and_then(|index| self.record(*index))
            .cloned()
            .ok_or_else(|| FetchError::NotFound { id: id.clone() })
    }

    fn fetch_permissions(&self, id: &ItemId) -> Result<Vec<Permission>, FetchError> {
        if self.denied.contains(id) {
            return Err(FetchError::PermissionDenied { id: id.clone() });
        }
        self.listing
            .permissions
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound { id: id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ListingStore {
        ListingStore::from_listing(Listing {
            items: vec![RemoteItem::file("f", "notes.txt").with_parent("d")],
            detached: vec![RemoteItem::folder("d", "Hidden")],
            permissions: HashMap::from([(ItemId::from("f"), vec![Permission::anyone()])]),
            denied: vec![ItemId::from("secret")],
        })
    }

    #[test]
    fn test_enumerates_only_items() {
        let store = sample();
        let ids: Vec<ItemId> = store.enumerate().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec![ItemId::from("f")]);
    }

    #[test]
    fn test_fetches_detached_and_enumerated() {
        let store = sample();
        assert_eq!(store.fetch_item(&"d".into()).unwrap().name, "Hidden");
        assert_eq!(store.fetch_item(&"f".into()).unwrap().name, "notes.txt");
        assert!(matches!(
            store.fetch_item(&"missing".into()),
            Err(FetchError::NotFound { .. })
        ));
        assert!(matches!(
            store.fetch_item(&"secret".into()),
            Err(FetchError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_permissions_lookup() {
        let store = sample();
        assert_eq!(store.fetch_permissions(&"f".into()).unwrap().len(), 1);
        assert!(store.fetch_permissions(&"d".into()).is_err());
    }

    #[test]
    fn test_parse_listing_json() {
        let json = r#"{
            "items": [
                {"id": "a", "title": "Report", "mimeType": "text/plain",
                 "parents": ["root"], "fileSize": 12, "shared": true,
                 "owners": [{"displayName": "Ada"}], "ownerNames": ["Ada"]}
            ],
            "permissions": {"a": [{"type": "user", "emailAddress": "ada@example.com"}]}
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        let item = &listing.items[0];
        assert_eq!(item.name, "Report");
        assert_eq!(item.size, Some(12));
        assert!(item.shared);
        assert!(listing.detached.is_empty());
        assert!(listing.permissions.contains_key(&ItemId::from("a")));
    }
}
