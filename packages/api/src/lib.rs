//! # API crate — account flows and the remote backend for the notes workspace
//!
//! The `store` crate knows how to cache, reconcile and mirror notes. This crate
//! adds the pieces an application shell calls directly:
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | — | Local account directory (signup/login rules), Argon2 password hashing, remote endpoint config |
//! | [`rest`] | `remote` | [`store::RemoteStore`] over a PostgREST-style HTTP API via `reqwest` |
//!
//! ## Workspace
//!
//! [`Workspace`] ties an account directory, the active-user pointer and a
//! [`NoteSync`] together. Signup and login fold the guest collection into the
//! account before switching the active user; logout returns to the guest
//! collection without touching any notes.

pub mod auth;
#[cfg(feature = "remote")]
pub mod rest;

use std::path::{Path, PathBuf};

use store::{
    export_to_file, Account, Identity, KeyValueStore, LoadedNotes, LocalCache, MirrorStatus, Note,
    NoteSync, RemoteStore, SaveError, StoreResult, Theme, WorkspaceConfig,
};

use auth::{AccountDirectory, AuthError, SignupForm};

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// One user-facing notes workspace: accounts, active identity and note sync.
pub struct Workspace<S: KeyValueStore, R: RemoteStore> {
    sync: NoteSync<S, R>,
    config: WorkspaceConfig,
}

impl<S: KeyValueStore, R: RemoteStore> Workspace<S, R> {
    pub fn new(store: S, remote: R, config: WorkspaceConfig) -> Self {
        let cache = LocalCache::new(store, &config);
        Self {
            sync: NoteSync::new(cache, remote),
            config,
        }
    }

    pub fn sync(&self) -> &NoteSync<S, R> {
        &self.sync
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn accounts(&self) -> AccountDirectory<'_, S> {
        AccountDirectory::new(self.sync.cache(), &self.config.accounts)
    }

    /// Register, merge guest notes into the new account and make it active.
    pub async fn signup(&self, form: &SignupForm) -> Result<Account, AuthError> {
        let account = self.accounts().register(form).await?;
        self.enter(&account.username).await?;
        Ok(account)
    }

    /// Check credentials, merge guest notes and make the account active.
    pub async fn login(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        let account = self.accounts().authenticate(username, password).await?;
        self.enter(&account.username).await?;
        Ok(account)
    }

    /// Back to the guest collection. Notes stay where they are.
    pub async fn logout(&self) -> StoreResult<()> {
        self.sync.cache().clear_active_user().await?;
        tracing::info!("signed out, now guest");
        Ok(())
    }

    pub async fn active_identity(&self) -> Identity {
        Identity::from_username(self.sync.cache().active_user().await.as_deref())
    }

    pub async fn load_current(&self) -> LoadedNotes {
        let identity = self.active_identity().await;
        self.sync.load_notes(&identity).await
    }

    pub async fn save_current(&self, notes: &[Note]) -> Result<MirrorStatus, SaveError> {
        let identity = self.active_identity().await;
        self.sync.save_notes(&identity, notes).await
    }

    /// Write the active collection as `notes-backup.txt` under `dir`.
    pub async fn export_current(&self, dir: &Path) -> StoreResult<PathBuf> {
        let loaded = self.load_current().await;
        export_to_file(&loaded.notes, dir)
    }

    pub async fn theme(&self) -> Theme {
        self.sync.cache().theme().await
    }

    pub async fn set_theme(&self, theme: Theme) -> StoreResult<()> {
        self.sync.cache().set_theme(theme).await
    }

    async fn enter(&self, username: &str) -> Result<(), AuthError> {
        // A failed merge leaves both collections as they were; the login still stands.
        if let Err(e) = self.sync.merge_guest_into(username).await {
            tracing::error!("guest merge into {} failed: {}", username, e);
        }
        self.sync.cache().set_active_user(username).await?;
        tracing::info!("active user is now {}", username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryRemote, MemoryStore, OfflineRemote, ReadSource};

    fn workspace() -> Workspace<MemoryStore, OfflineRemote> {
        Workspace::new(MemoryStore::new(), OfflineRemote, WorkspaceConfig::default())
    }

    fn ids(notes: &[Note]) -> Vec<String> {
        notes.iter().map(|n| n.id.clone()).collect()
    }

    fn note(id: &str) -> Note {
        let mut note = Note::new(id, "");
        note.id = id.to_string();
        note
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }

    #[tokio::test]
    async fn test_signup_activates_account() {
        let ws = workspace();
        assert_eq!(ws.active_identity().await, Identity::Guest);

        ws.save_current(&[note("g1")]).await.unwrap();
        ws.signup(&SignupForm::new("Alice", "secret1", "secret1"))
            .await
            .unwrap();

        assert_eq!(ws.active_identity().await, Identity::User("Alice".into()));
        assert_eq!(ids(&ws.load_current().await.notes), vec!["g1"]);
        assert!(ws.sync().cache().notes(&Identity::Guest).await.is_empty());

        let err = ws
            .signup(&SignupForm::new("alice", "secret1", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
        assert_eq!(ws.active_identity().await, Identity::User("Alice".into()));
    }

    #[tokio::test]
    async fn test_login_merges_guest_after_own_notes() {
        let ws = workspace();
        ws.signup(&SignupForm::new("alice", "secret1", "secret1"))
            .await
            .unwrap();
        ws.save_current(&[note("u1")]).await.unwrap();

        ws.logout().await.unwrap();
        assert_eq!(ws.active_identity().await, Identity::Guest);
        assert!(ws.load_current().await.notes.is_empty());
        ws.save_current(&[note("g1"), note("g2")]).await.unwrap();

        let account = ws.login("ALICE", "secret1").await.unwrap();
        assert_eq!(account.username, "alice");

        let loaded = ws.load_current().await;
        assert_eq!(loaded.source, ReadSource::Local);
        assert_eq!(ids(&loaded.notes), vec!["u1", "g1", "g2"]);

        // Guest collection was consumed, a second login adds nothing
        ws.logout().await.unwrap();
        ws.login("alice", "secret1").await.unwrap();
        assert_eq!(ws.load_current().await.notes.len(), 3);
    }

    #[tokio::test]
    async fn test_guest_username_cannot_take_guest_notes() {
        let ws = workspace();
        ws.save_current(&[note("g1")]).await.unwrap();

        assert!(matches!(
            ws.signup(&SignupForm::new("Guest", "secret1", "secret1")).await,
            Err(AuthError::UsernameReserved)
        ));
        assert_eq!(ws.active_identity().await, Identity::Guest);

        ws.signup(&SignupForm::new("bob", "secret1", "secret1"))
            .await
            .unwrap();
        assert_eq!(ids(&ws.load_current().await.notes), vec!["g1"]);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_guest() {
        let ws = workspace();
        ws.save_current(&[note("g1")]).await.unwrap();

        assert!(matches!(
            ws.login("nobody", "secret1").await,
            Err(AuthError::AccountNotFound)
        ));
        assert_eq!(ws.active_identity().await, Identity::Guest);
        assert_eq!(ids(&ws.load_current().await.notes), vec!["g1"]);
    }

    #[tokio::test]
    async fn test_save_current_mirrors_for_signed_in_user() {
        let remote = MemoryRemote::new();
        let ws = Workspace::new(MemoryStore::new(), remote.clone(), WorkspaceConfig::default());
        ws.signup(&SignupForm::new("alice", "secret1", "secret1"))
            .await
            .unwrap();
        remote.sign_in("uid-1");

        let status = ws.save_current(&[note("a"), note("b")]).await.unwrap();
        assert_eq!(status, MirrorStatus::Mirrored { count: 2 });
        assert_eq!(remote.notes_of("uid-1").len(), 2);

        let loaded = ws.load_current().await;
        assert_eq!(loaded.source, ReadSource::Remote);
    }

    #[tokio::test]
    async fn test_theme_and_export() {
        let ws = workspace();
        assert_eq!(ws.theme().await, Theme::Dark);
        ws.set_theme(Theme::Light).await.unwrap();
        assert_eq!(ws.theme().await, Theme::Light);

        ws.save_current(&[Note::new("Groceries", "milk")]).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = ws.export_current(dir.path()).await.unwrap();
        assert!(path.ends_with("notes-backup.txt"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("Title: Groceries"));
    }
}
