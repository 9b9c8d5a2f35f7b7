//! Error and diagnostic types for audit runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::item::ItemId;
use crate::node::ResolutionState;

/// Failure of a single remote fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The item does not exist (or is not visible at all).
    #[error("Item not found: {id}")]
    NotFound { id: ItemId },

    /// The item exists but the user may not read it.
    #[error("Permission denied: {id}")]
    PermissionDenied { id: ItemId },

    /// Temporary fault (rate limit, timeout, 5xx).
    #[error("Transient failure fetching {id}: {message}")]
    Transient { id: ItemId, message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl FetchError {
    /// Check whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Other { .. })
    }
}

/// Errors that abort an audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A node was resolved a second time.
    #[error("Node {id} resolved twice (already {state})")]
    AlreadyResolved { id: ItemId, state: ResolutionState },

    /// A resolved node has no parent but is neither root nor orphan.
    #[error("Node {id} has no parent and is neither root nor orphan")]
    Unanchored { id: ItemId },

    /// Parent links loop back onto themselves.
    #[error("Parent cycle detected at node {id}")]
    ParentCycle { id: ItemId },

    /// Derived sharing attributes contradict the store's sharing model.
    #[error("Sharing model violated for {id}: {detail}")]
    SharingModel { id: ItemId, detail: String },

    /// A node id was expected in the registry but is absent.
    #[error("Unknown node: {id}")]
    UnknownNode { id: ItemId },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// I/O error reading an input file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl AuditError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error with path context.
    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Check if this error means the tree invariants are broken.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyResolved { .. }
                | Self::Unanchored { .. }
                | Self::ParentCycle { .. }
                | Self::SharingModel { .. }
                | Self::UnknownNode { .. }
        )
    }
}

/// Kind of audit warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum WarningKind {
    /// Item declares more than one parent; only the first is honored.
    MultipleParents,
    /// `owners` and `ownerNames` disagree in length.
    OwnerCountMismatch,
    /// An expected field was missing or empty.
    MissingField,
    /// Lazy lookup of a folder failed.
    LookupFailed,
    /// Permission fetch exhausted its attempts.
    EnrichmentAbandoned,
    /// Permission entry of an unrecognized type.
    UnknownPermissionKind,
    /// The enumeration stream yielded an error.
    EnumerationError,
    /// The same id was enumerated more than once.
    DuplicateItem,
    /// Sharing attributes contradict the sharing model (non-strict mode).
    SharingModel,
}

/// Non-fatal diagnostic recorded during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditWarning {
    /// Item the warning is about, if any.
    pub item_id: Option<ItemId>,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl AuditWarning {
    /// Create a new audit warning.
    pub fn new(item_id: Option<ItemId>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            item_id,
            message: message.into(),
            kind,
        }
    }

    /// Create a multiple-parents warning.
    pub fn multiple_parents(id: &ItemId, name: &str, count: usize) -> Self {
        Self::new(
            Some(id.clone()),
            format!("{name} declares {count} parents; only the first is honored"),
            WarningKind::MultipleParents,
        )
    }

    /// Create a lookup-failed warning.
    pub fn lookup_failed(id: &ItemId, error: &FetchError) -> Self {
        Self::new(
            Some(id.clone()),
            format!("Folder lookup failed: {error}"),
            WarningKind::LookupFailed,
        )
    }

    /// Create an enrichment-abandoned warning.
    pub fn enrichment_abandoned(id: &ItemId, attempts: u32, error: &FetchError) -> Self {
        Self::new(
            Some(id.clone()),
            format!("Permission fetch abandoned after {attempts} attempt(s): {error}"),
            WarningKind::EnrichmentAbandoned,
        )
    }
}
