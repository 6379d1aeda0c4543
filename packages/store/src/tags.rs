//! Tag colors, per-user custom tags and tag edits on notes.

use std::collections::BTreeSet;

use crate::cache::LocalCache;
use crate::error::TagError;
use crate::kv::KeyValueStore;
use crate::models::{CustomTag, Identity, Note};

/// Tags every user starts with, and their colors.
pub const PREDEFINED_TAGS: [(&str, &str); 5] = [
    ("work", "#6aa6ff"),
    ("personal", "#ff85a1"),
    ("ideas", "#faca6b"),
    ("todo", "#88ffc3"),
    ("remote", "#b084ff"),
];

/// Color for tags nobody assigned one to.
pub const DEFAULT_TAG_COLOR: &str = "#4f6b95";

/// Color for an empty tag name.
pub const EMPTY_TAG_COLOR: &str = "#0f1526";

/// Resolve the display color of `tag`. Custom tags override predefined ones;
/// matching is case-insensitive.
pub fn tag_color(tag: &str, custom: &[CustomTag]) -> String {
    if tag.is_empty() {
        return EMPTY_TAG_COLOR.to_string();
    }
    let lower = tag.to_lowercase();
    if let Some(c) = custom
        .iter()
        .rev()
        .find(|c| c.name.to_lowercase() == lower && !c.color.is_empty())
    {
        return c.color.clone();
    }
    PREDEFINED_TAGS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, color)| color.to_string())
        .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string())
}

/// Every known tag for a user: predefined, custom, and those used by `notes`.
/// Sorted and deduplicated.
pub fn all_tags(custom: &[CustomTag], notes: &[Note]) -> Vec<String> {
    let mut tags: BTreeSet<String> = PREDEFINED_TAGS
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();
    tags.extend(custom.iter().map(|t| t.name.clone()));
    tags.extend(notes.iter().flat_map(|n| n.tags.iter().cloned()));
    tags.into_iter().collect()
}

/// Tags from `all` containing `query`, case-insensitively.
pub fn search_tags<'a>(all: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.to_lowercase();
    all.iter()
        .filter(|t| t.to_lowercase().contains(&query))
        .map(String::as_str)
        .collect()
}

/// Add `tag` to `note` unless present. Returns whether the note changed.
pub fn add_tag(note: &mut Note, tag: &str) -> bool {
    let tag = tag.trim();
    if tag.is_empty() || note.tags.iter().any(|t| t == tag) {
        return false;
    }
    note.tags.push(tag.to_string());
    note.touch();
    true
}

/// Remove `tag` from `note`. Returns whether the note changed.
pub fn remove_tag(note: &mut Note, tag: &str) -> bool {
    let before = note.tags.len();
    note.tags.retain(|t| t != tag);
    if note.tags.len() == before {
        return false;
    }
    note.touch();
    true
}

/// Create a custom tag for `identity` and persist the updated list.
///
/// The name is trimmed; empty names and names already used by a custom tag
/// (case-insensitive) are rejected without touching storage.
pub async fn create_custom_tag<S: KeyValueStore>(
    cache: &LocalCache<S>,
    identity: &Identity,
    name: &str,
    color: &str,
    description: &str,
) -> Result<CustomTag, TagError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TagError::NameRequired);
    }

    let mut existing = cache.custom_tags(identity).await;
    let lower = name.to_lowercase();
    if existing.iter().any(|t| t.name.to_lowercase() == lower) {
        return Err(TagError::DuplicateName);
    }

    let tag = CustomTag {
        name: name.to_string(),
        color: color.to_string(),
        description: description.trim().to_string(),
    };
    existing.push(tag.clone());
    cache.set_custom_tags(identity, &existing).await?;
    tracing::debug!("created tag {} for {}", tag.name, identity.namespace());
    Ok(tag)
}
