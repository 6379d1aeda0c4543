//! # Domain models for notes, accounts and tags
//!
//! Defines the records persisted in the local cache and exchanged with the
//! remote store. All of them are `Serialize + Deserialize`; the local cache
//! stores them as camelCase JSON so existing browser-era data stays readable.
//!
//! ## Types
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Note`] | A single note. `id` is opaque and stable across local and remote copies; `tags` behaves as a set. |
//! | [`Account`] | An entry of the local account directory. New entries hold an Argon2 PHC string; plaintext from older builds is read once and rehashed. |
//! | [`CustomTag`] | A user-defined tag with a display color and description. |
//! | [`Folder`], [`Profile`], [`SharedNote`] | Remote-only records, passed through untouched by the sync layer. |
//! | [`Identity`] | Who a read or write is for: the guest sentinel or a named user. |
//! | [`Theme`] | The persisted light/dark preference. |

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Namespace used for notes written before anyone signs in.
pub const GUEST: &str = "guest";

/// Current time as an ISO-8601 string with millisecond precision (`2024-01-01T12:00:00.000Z`).
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A note in a user's collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub editor_pattern: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

impl Note {
    /// Create a note with a fresh id and both timestamps set to now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_iso();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            folder_id: None,
            theme: None,
            editor_pattern: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Builder: attach tags, dropping duplicates.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    /// Mark the note as modified.
    pub fn touch(&mut self) {
        self.updated_at = now_iso();
    }

    /// Whether the record carries enough to be kept. Anything without an id is
    /// treated as malformed.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Local account directory entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    /// Argon2id PHC string. Empty for directories written before hashing.
    #[serde(default)]
    pub password_hash: String,
    /// Plaintext left by older builds; replaced by a hash on the next login.
    #[serde(default, rename = "password", skip_serializing_if = "Option::is_none")]
    pub legacy_password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Account {
    /// Case-insensitive username comparison.
    pub fn matches(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.trim().to_lowercase()
    }
}

/// Optional fields to overwrite on an existing account.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountPatch {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub description: Option<String>,
}

/// A user-defined tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomTag {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

/// A folder as stored remotely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// The remote profile record of the signed-in user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A publicly readable copy of a note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedNote {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The identity a read or write is performed for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Guest,
    User(String),
}

impl Identity {
    /// Map an optional username to an identity. Empty names and the literal
    /// guest sentinel both mean [`Identity::Guest`].
    pub fn from_username(username: Option<&str>) -> Self {
        match username.map(str::trim) {
            Some(name) if !name.is_empty() && name != GUEST => Identity::User(name.to_string()),
            _ => Identity::Guest,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }

    /// The namespace segment used in storage keys.
    pub fn namespace(&self) -> &str {
        match self {
            Identity::Guest => GUEST,
            Identity::User(name) => name,
        }
    }
}

/// Light/dark preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Anything other than `"light"` is dark.
    pub fn parse(s: &str) -> Self {
        if s.trim() == "light" {
            Theme::Light
        } else {
            Theme::Dark
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}
