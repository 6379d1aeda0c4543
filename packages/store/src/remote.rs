//! # Remote note store — the interface the sync layer consumes
//!
//! The remote side is an authenticated collection store owned by someone else.
//! This module only describes what [`crate::NoteSync`] needs from it:
//!
//! | Method | Tables touched |
//! |--------|----------------|
//! | [`current_session`](RemoteStore::current_session) | auth |
//! | [`fetch_notes`](RemoteStore::fetch_notes) / [`upsert_notes`](RemoteStore::upsert_notes) / [`delete_note`](RemoteStore::delete_note) | `notes` |
//! | [`fetch_folders`](RemoteStore::fetch_folders) / [`upsert_folder`](RemoteStore::upsert_folder) | `folders` |
//! | [`fetch_profile`](RemoteStore::fetch_profile) | `profiles` |
//! | [`share_note`](RemoteStore::share_note) / [`get_shared_note`](RemoteStore::get_shared_note) | `shared_notes` (public read) |
//!
//! Remote records use snake_case columns and carry the owner id
//! ([`RemoteNote`], [`RemoteFolder`]). Conversion to and from the local shapes
//! is a pure field rename.
//!
//! ## Implementations
//!
//! - [`OfflineRemote`]: never has a session; used when no endpoint is configured.
//! - [`MemoryRemote`]: in-process store with switches for going offline and
//!   failing writes; used by tests and local development.
//! - `api::RestRemote`: HTTP client for a PostgREST-style endpoint.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, RemoteResult};
use crate::models::{Folder, Note, Profile, SharedNote};

/// An authenticated remote session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Owner id used on every remote row.
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub access_token: String,
}

/// A row of the remote `notes` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteNote {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub editor_pattern: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteNote {
    /// Remote shape of `note`, owned by `owner_id`.
    pub fn from_note(note: &Note, owner_id: &str) -> Self {
        Self {
            id: note.id.clone(),
            user_id: owner_id.to_string(),
            title: Some(note.title.clone()),
            content: Some(note.content.clone()),
            tags: Some(note.tags.clone()),
            folder_id: note.folder_id.clone(),
            theme: note.theme.clone(),
            editor_pattern: note.editor_pattern.clone(),
            created_at: Some(note.created_at.clone()),
            updated_at: Some(note.updated_at.clone()),
        }
    }
}

impl From<RemoteNote> for Note {
    fn from(r: RemoteNote) -> Self {
        Note {
            id: r.id,
            title: r.title.unwrap_or_default(),
            content: r.content.unwrap_or_default(),
            tags: r.tags.unwrap_or_default(),
            folder_id: r.folder_id,
            theme: r.theme,
            editor_pattern: r.editor_pattern,
            created_at: r.created_at.unwrap_or_default(),
            updated_at: r.updated_at.unwrap_or_default(),
        }
    }
}

/// A row of the remote `folders` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteFolder {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl RemoteFolder {
    pub fn from_folder(folder: &Folder, owner_id: &str) -> Self {
        Self {
            id: folder.id.clone(),
            user_id: owner_id.to_string(),
            name: folder.name.clone(),
            parent_id: folder.parent_id.clone(),
        }
    }
}

impl From<RemoteFolder> for Folder {
    fn from(r: RemoteFolder) -> Self {
        Folder {
            id: r.id,
            name: r.name,
            parent_id: r.parent_id,
        }
    }
}

/// Insert payload for `shared_notes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewSharedNote {
    pub title: String,
    pub content: String,
    pub user_id: String,
}

/// Async interface to the remote store.
pub trait RemoteStore {
    /// The signed-in session, or `None` when nobody is signed in.
    fn current_session(&self) -> impl Future<Output = RemoteResult<Option<Session>>>;

    fn fetch_notes(&self, owner_id: &str) -> impl Future<Output = RemoteResult<Vec<RemoteNote>>>;

    /// Insert or replace every row by id, in one call.
    fn upsert_notes(&self, notes: Vec<RemoteNote>) -> impl Future<Output = RemoteResult<()>>;

    fn delete_note(&self, id: &str) -> impl Future<Output = RemoteResult<()>>;

    fn fetch_folders(&self, owner_id: &str)
        -> impl Future<Output = RemoteResult<Vec<RemoteFolder>>>;

    fn upsert_folder(&self, folder: RemoteFolder) -> impl Future<Output = RemoteResult<()>>;

    fn fetch_profile(&self, user_id: &str) -> impl Future<Output = RemoteResult<Option<Profile>>>;

    fn share_note(&self, note: NewSharedNote) -> impl Future<Output = RemoteResult<SharedNote>>;

    /// Public read; works without a session.
    fn get_shared_note(&self, id: &str) -> impl Future<Output = RemoteResult<Option<SharedNote>>>;
}

/// A remote that is never signed in.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineRemote;

impl RemoteStore for OfflineRemote {
    async fn current_session(&self) -> RemoteResult<Option<Session>> {
        Ok(None)
    }

    async fn fetch_notes(&self, _owner_id: &str) -> RemoteResult<Vec<RemoteNote>> {
        Err(RemoteError::Unauthorized)
    }

    async fn upsert_notes(&self, _notes: Vec<RemoteNote>) -> RemoteResult<()> {
        Err(RemoteError::Unauthorized)
    }

    async fn delete_note(&self, _id: &str) -> RemoteResult<()> {
        Err(RemoteError::Unauthorized)
    }

    async fn fetch_folders(&self, _owner_id: &str) -> RemoteResult<Vec<RemoteFolder>> {
        Err(RemoteError::Unauthorized)
    }

    async fn upsert_folder(&self, _folder: RemoteFolder) -> RemoteResult<()> {
        Err(RemoteError::Unauthorized)
    }

    async fn fetch_profile(&self, _user_id: &str) -> RemoteResult<Option<Profile>> {
        Err(RemoteError::Unauthorized)
    }

    async fn share_note(&self, _note: NewSharedNote) -> RemoteResult<SharedNote> {
        Err(RemoteError::Unauthorized)
    }

    async fn get_shared_note(&self, _id: &str) -> RemoteResult<Option<SharedNote>> {
        Err(RemoteError::Network("no remote configured".into()))
    }
}

#[derive(Debug, Default)]
struct MemoryRemoteState {
    session: Option<Session>,
    offline: bool,
    fail_writes: bool,
    notes: Vec<RemoteNote>,
    folders: Vec<RemoteFolder>,
    profiles: Vec<Profile>,
    shared: Vec<SharedNote>,
    upsert_calls: usize,
    next_shared_id: u64,
}

/// In-memory remote store for tests and local development.
///
/// Clones share state. While offline every call fails with
/// [`RemoteError::Network`]; with failing writes enabled only mutating calls do.
#[derive(Clone, Debug, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryRemoteState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `user_id`.
    pub fn sign_in(&self, user_id: &str) {
        self.lock().session = Some(Session {
            user_id: user_id.to_string(),
            email: None,
            access_token: format!("token-{user_id}"),
        });
    }

    pub fn sign_out(&self) {
        self.lock().session = None;
    }

    pub fn set_online(&self, online: bool) {
        self.lock().offline = !online;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Rows owned by `owner_id`, in insertion order.
    pub fn notes_of(&self, owner_id: &str) -> Vec<RemoteNote> {
        self.lock()
            .notes
            .iter()
            .filter(|n| n.user_id == owner_id)
            .cloned()
            .collect()
    }

    /// How many `upsert_notes` calls reached the store.
    pub fn upsert_calls(&self) -> usize {
        self.lock().upsert_calls
    }

    pub fn put_profile(&self, profile: Profile) {
        let mut state = self.lock();
        state.profiles.retain(|p| p.id != profile.id);
        state.profiles.push(profile);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reachable(&self) -> RemoteResult<MutexGuard<'_, MemoryRemoteState>> {
        let state = self.lock();
        if state.offline {
            return Err(RemoteError::Network("remote unreachable".into()));
        }
        Ok(state)
    }

    fn writable(&self) -> RemoteResult<MutexGuard<'_, MemoryRemoteState>> {
        let state = self.reachable()?;
        if state.session.is_none() {
            return Err(RemoteError::Unauthorized);
        }
        if state.fail_writes {
            return Err(RemoteError::Status {
                status: 500,
                body: "write rejected".into(),
            });
        }
        Ok(state)
    }
}

impl RemoteStore for MemoryRemote {
    async fn current_session(&self) -> RemoteResult<Option<Session>> {
        Ok(self.reachable()?.session.clone())
    }

    async fn fetch_notes(&self, owner_id: &str) -> RemoteResult<Vec<RemoteNote>> {
        let state = self.reachable()?;
        let mut notes: Vec<RemoteNote> = state
            .notes
            .iter()
            .filter(|n| n.user_id == owner_id)
            .cloned()
            .collect();
        // Newest first, like the hosted query
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn upsert_notes(&self, notes: Vec<RemoteNote>) -> RemoteResult<()> {
        let mut state = self.writable()?;
        state.upsert_calls += 1;
        for note in notes {
            match state.notes.iter().position(|n| n.id == note.id) {
                Some(i) => state.notes[i] = note,
                None => state.notes.push(note),
            }
        }
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> RemoteResult<()> {
        let mut state = self.writable()?;
        state.notes.retain(|n| n.id != id);
        Ok(())
    }

    async fn fetch_folders(&self, owner_id: &str) -> RemoteResult<Vec<RemoteFolder>> {
        let state = self.reachable()?;
        Ok(state
            .folders
            .iter()
            .filter(|f| f.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn upsert_folder(&self, folder: RemoteFolder) -> RemoteResult<()> {
        let mut state = self.writable()?;
        match state.folders.iter().position(|f| f.id == folder.id) {
            Some(i) => state.folders[i] = folder,
            None => state.folders.push(folder),
        }
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &str) -> RemoteResult<Option<Profile>> {
        let state = self.reachable()?;
        Ok(state.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn share_note(&self, note: NewSharedNote) -> RemoteResult<SharedNote> {
        let mut state = self.writable()?;
        state.next_shared_id += 1;
        let shared = SharedNote {
            id: format!("shared-{}", state.next_shared_id),
            title: note.title,
            content: note.content,
            user_id: Some(note.user_id),
            created_at: Some(crate::models::now_iso()),
        };
        state.shared.push(shared.clone());
        Ok(shared)
    }

    async fn get_shared_note(&self, id: &str) -> RemoteResult<Option<SharedNote>> {
        let state = self.reachable()?;
        Ok(state.shared.iter().find(|s| s.id == id).cloned())
    }
}
