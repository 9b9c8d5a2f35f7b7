//! Core types for driveaudit.
//!
//! This crate provides the data model shared by the audit engine and the
//! reports: raw item records, folder nodes with their resolution state
//! machine, configuration, statistics and the error taxonomy.

mod config;
mod error;
mod item;
mod node;
mod stats;

pub use config::{AuditConfig, AuditConfigBuilder};
pub use error::{AuditError, AuditWarning, FetchError, WarningKind};
pub use item::{FOLDER_MIME_TYPE, ItemId, Owner, Permission, PermissionKind, RemoteItem};
pub use node::{Node, Resolution, ResolutionState, Resolved, Role};
pub use stats::AuditStats;
