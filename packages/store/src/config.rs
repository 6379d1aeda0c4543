//! # Workspace configuration — `notes-workspace.toml`
//!
//! Defines the TOML file read at startup (filename:
//! [`WorkspaceConfig::filename`] = `"notes-workspace.toml"`). It controls how
//! local storage keys are named and the account rules enforced at signup.
//!
//! ## Structure
//!
//! ```toml
//! [storage]
//! prefix = "notesWorkspace"   # prefix of every local storage key
//!
//! [accounts]
//! min_password_length = 6
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`WorkspaceConfig`] | Top-level config with builder helpers, TOML (de)serialisation and a forgiving [`load`](WorkspaceConfig::load). |
//! | [`StorageConfig`] | Key prefix. All key names are derived here so the cache never formats keys itself. |
//! | [`AccountsConfig`] | Minimum password length, default **6**. |
//!
//! Every section derives `Default`, so a missing or empty file is the
//! default configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `notes-workspace.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
}

/// Local storage key naming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "notesWorkspace".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

impl StorageConfig {
    /// `<prefix>.notes.<namespace>`, with `.` and `%` in the namespace
    /// percent-encoded so a username can never reach another entry's key.
    pub fn notes_key(&self, namespace: &str) -> String {
        format!("{}.notes.{}", self.prefix, encode_segment(namespace))
    }

    /// `<prefix>.notes.<namespace>.tags`
    pub fn tags_key(&self, namespace: &str) -> String {
        format!("{}.tags", self.notes_key(namespace))
    }

    /// Versioned so the record shape can change later.
    pub fn accounts_key(&self) -> String {
        format!("{}.accounts.v1", self.prefix)
    }

    pub fn active_user_key(&self) -> String {
        format!("{}.activeUser", self.prefix)
    }

    pub fn theme_key(&self) -> String {
        format!("{}.theme", self.prefix)
    }
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            '.' => out.push_str("%2E"),
            _ => out.push(c),
        }
    }
    out
}

/// Account rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

fn default_min_password_length() -> usize {
    6
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
        }
    }
}

impl WorkspaceConfig {
    /// Create a config with the given key prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            storage: StorageConfig {
                prefix: prefix.into(),
            },
            accounts: AccountsConfig::default(),
        }
    }

    /// Builder method to change the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage.prefix = prefix.into();
        self
    }

    /// Builder method to set the minimum password length.
    pub fn with_min_password_length(mut self, len: usize) -> Self {
        self.accounts.min_password_length = len;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "notes-workspace.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read `path`, falling back to defaults when the file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(path) else {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Self::default();
        };
        match Self::from_toml(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
