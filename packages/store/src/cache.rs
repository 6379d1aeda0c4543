//! # Local cache — typed, namespaced view over a [`KeyValueStore`]
//!
//! [`LocalCache`] is the always-available half of the sync layer. It owns the
//! key naming (via [`StorageConfig`]) and the JSON encoding of every persisted
//! record:
//!
//! | Entry | Key | Value |
//! |-------|-----|-------|
//! | notes | `<prefix>.notes.<namespace>` | array of [`Note`] |
//! | custom tags | `<prefix>.notes.<namespace>.tags` | array of [`CustomTag`] |
//! | accounts | `<prefix>.accounts.v1` | array of [`Account`] |
//! | active user | `<prefix>.activeUser` | plain username |
//! | theme | `<prefix>.theme` | `"light"` / `"dark"` |
//!
//! ## Reads degrade to empty
//!
//! A missing entry, text that is not a JSON array, or an array element that does
//! not decode into the expected record is treated as absent. Malformed elements
//! are skipped individually and logged, so one bad record does not hide the
//! rest of a collection.
//!
//! ## Writes overwrite
//!
//! Every setter replaces the whole entry and reports whether the backend
//! committed it. Nothing here panics on bad data.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{StorageConfig, WorkspaceConfig};
use crate::error::StoreResult;
use crate::kv::KeyValueStore;
use crate::models::{Account, CustomTag, Identity, Note, Theme};

/// Typed access to everything the workspace keeps locally.
#[derive(Clone, Debug)]
pub struct LocalCache<S: KeyValueStore> {
    store: S,
    keys: StorageConfig,
}

impl<S: KeyValueStore> LocalCache<S> {
    pub fn new(store: S, config: &WorkspaceConfig) -> Self {
        Self {
            store,
            keys: config.storage.clone(),
        }
    }

    /// The underlying key-value backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self) -> &StorageConfig {
        &self.keys
    }

    // --- notes ---

    pub async fn notes(&self, identity: &Identity) -> Vec<Note> {
        self.read_list(&self.keys.notes_key(identity.namespace()), Note::is_valid)
            .await
    }

    pub async fn set_notes(&self, identity: &Identity, notes: &[Note]) -> StoreResult<()> {
        self.write_list(&self.keys.notes_key(identity.namespace()), notes)
            .await
    }

    pub async fn clear_notes(&self, identity: &Identity) -> StoreResult<()> {
        self.store
            .remove(&self.keys.notes_key(identity.namespace()))
            .await
    }

    // --- custom tags ---

    pub async fn custom_tags(&self, identity: &Identity) -> Vec<CustomTag> {
        self.read_list(&self.keys.tags_key(identity.namespace()), |t: &CustomTag| {
            !t.name.trim().is_empty()
        })
        .await
    }

    pub async fn set_custom_tags(
        &self,
        identity: &Identity,
        tags: &[CustomTag],
    ) -> StoreResult<()> {
        self.write_list(&self.keys.tags_key(identity.namespace()), tags)
            .await
    }

    // --- accounts ---

    pub async fn accounts(&self) -> Vec<Account> {
        self.read_list(&self.keys.accounts_key(), |a: &Account| {
            !a.username.trim().is_empty()
        })
        .await
    }

    pub async fn set_accounts(&self, accounts: &[Account]) -> StoreResult<()> {
        self.write_list(&self.keys.accounts_key(), accounts).await
    }

    // --- active user ---

    pub async fn active_user(&self) -> Option<String> {
        let raw = self.store.get(&self.keys.active_user_key()).await?;
        let name = raw.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Empty names are ignored.
    pub async fn set_active_user(&self, username: &str) -> StoreResult<()> {
        if username.trim().is_empty() {
            return Ok(());
        }
        self.store
            .set(&self.keys.active_user_key(), username.trim().to_string())
            .await
    }

    pub async fn clear_active_user(&self) -> StoreResult<()> {
        self.store.remove(&self.keys.active_user_key()).await
    }

    // --- theme ---

    pub async fn theme(&self) -> Theme {
        self.store
            .get(&self.keys.theme_key())
            .await
            .map(|raw| Theme::parse(&raw))
            .unwrap_or_default()
    }

    pub async fn set_theme(&self, theme: Theme) -> StoreResult<()> {
        self.store
            .set(&self.keys.theme_key(), theme.as_str().to_string())
            .await
    }

    // --- encoding ---

    async fn read_list<T, F>(&self, key: &str, valid: F) -> Vec<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let Some(raw) = self.store.get(key).await else {
            return Vec::new();
        };
        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("treating corrupt entry {} as empty: {}", key, e);
                return Vec::new();
            }
        };

        let total = values.len();
        let items: Vec<T> = values
            .into_iter()
            .filter_map(|v| serde_json::from_value::<T>(v).ok())
            .filter(|item| valid(item))
            .collect();
        if items.len() < total {
            tracing::warn!(
                "skipped {} malformed record(s) in {}",
                total - items.len(),
                key
            );
        }
        items
    }

    async fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> StoreResult<()> {
        let raw = serde_json::to_string(items)?;
        self.store.set(key, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn cache() -> (LocalCache<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        (LocalCache::new(store.clone(), &WorkspaceConfig::default()), store)
    }

    #[tokio::test]
    async fn test_notes_roundtrip_per_namespace() {
        let (cache, _) = cache();
        let guest = Identity::Guest;
        let alice = Identity::User("alice".into());

        let note = Note::new("a", "b");
        cache.set_notes(&alice, &[note.clone()]).await.unwrap();

        assert_eq!(cache.notes(&alice).await, vec![note]);
        assert!(cache.notes(&guest).await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_notes_read_as_empty() {
        let (cache, store) = cache();
        let key = cache.keys().notes_key("guest");

        store.set(&key, "{not json".into()).await.unwrap();
        assert!(cache.notes(&Identity::Guest).await.is_empty());

        store.set(&key, r#"{"id":"x"}"#.into()).await.unwrap();
        assert!(cache.notes(&Identity::Guest).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let (cache, store) = cache();
        let key = cache.keys().notes_key("guest");
        store
            .set(
                &key,
                r#"[{"id":"ok","title":"kept"}, {"title":"no id"}, 42, {"id":""}]"#.into(),
            )
            .await
            .unwrap();

        let notes = cache.notes(&Identity::Guest).await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "kept");
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let (cache, store) = cache();
        store.set_read_only(true);
        assert!(cache.set_notes(&Identity::Guest, &[Note::new("a", "")]).await.is_err());
        assert!(cache.notes(&Identity::Guest).await.is_empty());
    }

    #[tokio::test]
    async fn test_active_user_lifecycle() {
        let (cache, _) = cache();
        assert!(cache.active_user().await.is_none());

        cache.set_active_user("   ").await.unwrap();
        assert!(cache.active_user().await.is_none());

        cache.set_active_user("Bob").await.unwrap();
        assert_eq!(cache.active_user().await.as_deref(), Some("Bob"));

        cache.clear_active_user().await.unwrap();
        assert!(cache.active_user().await.is_none());
    }

    #[tokio::test]
    async fn test_dotted_username_keeps_to_its_own_entries() {
        let (cache, _) = cache();
        let bob = Identity::User("bob".into());
        let dotted = Identity::User("bob.tags".into());
        let tag = CustomTag {
            name: "urgent".into(),
            color: "#ef4444".into(),
            description: String::new(),
        };
        cache.set_custom_tags(&bob, &[tag.clone()]).await.unwrap();

        cache.set_notes(&dotted, &[Note::new("mine", "")]).await.unwrap();
        assert_eq!(cache.custom_tags(&bob).await, vec![tag]);
        assert!(cache.notes(&bob).await.is_empty());
        assert_eq!(cache.notes(&dotted).await.len(), 1);
    }

    #[tokio::test]
    async fn test_theme_defaults_to_dark() {
        let (cache, store) = cache();
        assert_eq!(cache.theme().await, Theme::Dark);

        cache.set_theme(Theme::Light).await.unwrap();
        assert_eq!(cache.theme().await, Theme::Light);

        store.set(&cache.keys().theme_key(), "neon".into()).await.unwrap();
        assert_eq!(cache.theme().await, Theme::Dark);
    }

    #[tokio::test]
    async fn test_custom_tags_and_accounts() {
        let (cache, _) = cache();
        let bob = Identity::User("bob".into());
        let tag = CustomTag {
            name: "urgent".into(),
            color: "#ef4444".into(),
            description: String::new(),
        };
        cache.set_custom_tags(&bob, &[tag.clone()]).await.unwrap();
        assert_eq!(cache.custom_tags(&bob).await, vec![tag]);
        assert!(cache.custom_tags(&Identity::Guest).await.is_empty());

        let account = Account {
            username: "bob".into(),
            password_hash: "$argon2id$...".into(),
            legacy_password: None,
            email: None,
            avatar: None,
            description: None,
        };
        cache.set_accounts(&[account.clone()]).await.unwrap();
        assert_eq!(cache.accounts().await, vec![account]);
    }
}
