//! Audit configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Configuration for an audit run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct AuditConfig {
    /// Owner name or email treated as the running user.
    #[builder(default)]
    pub primary_user: String,

    /// Names of recognized top-level containers.
    #[builder(default = "default_root_names()")]
    pub root_names: Vec<String>,

    /// Path prefix for items whose ancestry is invisible.
    #[builder(default = "default_orphan_prefix()")]
    pub orphan_prefix: String,

    /// Name given to folders whose lazy lookup failed.
    #[builder(default = "default_unreachable_name()")]
    pub unreachable_name: String,

    /// Items strictly larger than this many bytes are flagged.
    #[builder(default = "100_000_000")]
    pub large_file_threshold: u64,

    /// Storage-space tag of the photo space.
    #[builder(default = "\"photos\".to_string()")]
    pub photo_space: String,

    /// Storage-space tag of the app-private space.
    #[builder(default = "\"appDataFolder\".to_string()")]
    pub app_space: String,

    /// Maximum attempts for the secondary permission fetch.
    #[builder(default = "5")]
    pub permission_fetch_attempts: u32,

    /// Maximum attempts for lazy folder lookups (1 = no retry).
    #[builder(default = "1")]
    pub lazy_fetch_attempts: u32,

    /// Treat sharing-model contradictions as fatal instead of warnings.
    #[builder(default = "false")]
    pub enforce_sharing_model: bool,

    /// Items between progress updates.
    #[builder(default = "1000")]
    pub progress_interval: u64,
}

fn default_root_names() -> Vec<String> {
    vec!["My Drive".to_string()]
}

fn default_orphan_prefix() -> String {
    "0_orphan".to_string()
}

fn default_unreachable_name() -> String {
    "unreachable".to_string()
}

impl AuditConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref names) = self.root_names {
            if names.is_empty() {
                return Err("At least one root name is required".to_string());
            }
        }
        if self.permission_fetch_attempts == Some(0) || self.lazy_fetch_attempts == Some(0) {
            return Err("Fetch attempts must be at least 1".to_string());
        }
        if matches!(self.orphan_prefix.as_deref(), Some("")) {
            return Err("Orphan prefix cannot be empty".to_string());
        }
        if matches!(self.unreachable_name.as_deref(), Some("")) {
            return Err("Unreachable name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl AuditConfig {
    /// Create a new audit config builder.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Create a default config for the given primary user.
    pub fn new(primary_user: impl Into<String>) -> Self {
        Self {
            primary_user: primary_user.into(),
            root_names: default_root_names(),
            orphan_prefix: default_orphan_prefix(),
            unreachable_name: default_unreachable_name(),
            large_file_threshold: 100_000_000,
            photo_space: "photos".to_string(),
            app_space: "appDataFolder".to_string(),
            permission_fetch_attempts: 5,
            lazy_fetch_attempts: 1,
            enforce_sharing_model: false,
            progress_interval: 1000,
        }
    }

    /// Check if a name is a recognized top-level container.
    pub fn is_root_name(&self, name: &str) -> bool {
        self.root_names.iter().any(|r| r == name)
    }

    /// Re-check the builder constraints on an already-built config (for
    /// configs that came from a file rather than the builder).
    pub fn validate(&self) -> Result<(), AuditError> {
        let invalid = |message: &str| AuditError::InvalidConfig {
            message: message.to_string(),
        };
        if self.root_names.is_empty() {
            return Err(invalid("At least one root name is required"));
        }
        if self.permission_fetch_attempts == 0 || self.lazy_fetch_attempts == 0 {
            return Err(invalid("Fetch attempts must be at least 1"));
        }
        if self.orphan_prefix.is_empty() {
            return Err(invalid("Orphan prefix cannot be empty"));
        }
        if self.unreachable_name.is_empty() {
            return Err(invalid("Unreachable name cannot be empty"));
        }
        Ok(())
    }

    /// Load a config from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let text = std::fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        let config: Self = toml::from_str(&text).map_err(|e| AuditError::parse(path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location: `<config_dir>/driveaudit/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("driveaudit").join("config.toml"))
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::new("")
    }
}
