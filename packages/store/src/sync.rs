//! # NoteSync — local-first reads, writes and guest merge
//!
//! [`NoteSync`] is the context object the application threads through every
//! note operation. It owns the [`LocalCache`], the [`RemoteStore`] and the
//! [`ReconciliationPolicy`]; nothing in this crate keeps global state.
//!
//! ## Read path — [`load_notes`](NoteSync::load_notes)
//!
//! 1. Guest identity, no session, or a failing session query → the remote is skipped.
//! 2. Otherwise the owner's rows are fetched and renamed into [`Note`]s.
//! 3. The policy picks the result. With [`RemoteWhenNonEmpty`] a non-empty remote
//!    answer wins wholesale and anything else falls back to the local cache.
//!
//! ## Write path — [`save_notes`](NoteSync::save_notes)
//!
//! The whole collection is written to the local cache first. If that fails the
//! save fails and the remote is not touched. Afterwards, for a signed-in
//! non-guest identity, every note is upserted in one batch. The mirror outcome
//! comes back as a [`MirrorStatus`]; a failed mirror is logged and does not fail
//! the save. Nothing is retried, the next save mirrors the full collection again.
//!
//! ## Guest merge — [`merge_guest_into`](NoteSync::merge_guest_into)
//!
//! Appends guest notes after the user's own notes, then deletes the guest
//! collection so a later login has nothing left to merge. If the guest
//! collection cannot be deleted, the user's previous collection is written
//! back so the same notes are never merged twice. There is no deduplication
//! by id or content.

use crate::cache::LocalCache;
use crate::error::{RemoteError, RemoteResult, SaveError, StoreResult};
use crate::kv::KeyValueStore;
use crate::models::{Folder, Identity, Note, Profile, SharedNote};
use crate::policy::{ReadSource, ReconciliationPolicy, RemoteRead, RemoteWhenNonEmpty};
use crate::remote::{NewSharedNote, RemoteFolder, RemoteNote, RemoteStore, Session};

/// Result of a read.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedNotes {
    pub notes: Vec<Note>,
    pub source: ReadSource,
}

/// What happened to the remote copy after a local commit.
#[derive(Clone, Debug, PartialEq)]
pub enum MirrorStatus {
    /// Guest identity or no session.
    Skipped,
    Mirrored { count: usize },
    /// The local commit stands; the remote copy is stale until the next save.
    Failed(RemoteError),
}

impl MirrorStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, MirrorStatus::Failed(_))
    }
}

/// Local-first sync context.
pub struct NoteSync<S, R, P = RemoteWhenNonEmpty>
where
    S: KeyValueStore,
    R: RemoteStore,
    P: ReconciliationPolicy,
{
    cache: LocalCache<S>,
    remote: R,
    policy: P,
}

impl<S, R> NoteSync<S, R>
where
    S: KeyValueStore,
    R: RemoteStore,
{
    /// Sync with the whole-collection [`RemoteWhenNonEmpty`] policy.
    pub fn new(cache: LocalCache<S>, remote: R) -> Self {
        Self::with_policy(cache, remote, RemoteWhenNonEmpty)
    }
}

impl<S, R, P> NoteSync<S, R, P>
where
    S: KeyValueStore,
    R: RemoteStore,
    P: ReconciliationPolicy,
{
    pub fn with_policy(cache: LocalCache<S>, remote: R, policy: P) -> Self {
        Self {
            cache,
            remote,
            policy,
        }
    }

    pub fn cache(&self) -> &LocalCache<S> {
        &self.cache
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The remote session usable for `identity`, if any. Session lookup
    /// failures count as "no session".
    async fn session_for(&self, identity: &Identity) -> Option<Session> {
        if identity.is_guest() {
            return None;
        }
        match self.remote.current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("session lookup failed, staying local: {}", e);
                None
            }
        }
    }

    /// Load the collection for `identity`. Never fails.
    pub async fn load_notes(&self, identity: &Identity) -> LoadedNotes {
        let remote = match self.session_for(identity).await {
            None => RemoteRead::Skipped,
            Some(session) => match self.remote.fetch_notes(&session.user_id).await {
                Ok(rows) => RemoteRead::Fetched(rows.into_iter().map(Note::from).collect()),
                Err(e) => {
                    tracing::warn!("remote fetch failed, falling back to local: {}", e);
                    RemoteRead::Failed
                }
            },
        };

        let local = self.cache.notes(identity).await;
        let (notes, source) = self.policy.reconcile(remote, local);
        tracing::debug!(
            "loaded {} note(s) for {} from {:?}",
            notes.len(),
            identity.namespace(),
            source
        );
        LoadedNotes { notes, source }
    }

    /// Persist the full collection for `identity`, then mirror it.
    pub async fn save_notes(
        &self,
        identity: &Identity,
        notes: &[Note],
    ) -> Result<MirrorStatus, SaveError> {
        self.cache.set_notes(identity, notes).await?;

        let Some(session) = self.session_for(identity).await else {
            return Ok(MirrorStatus::Skipped);
        };

        let rows: Vec<RemoteNote> = notes
            .iter()
            .map(|n| RemoteNote::from_note(n, &session.user_id))
            .collect();
        let count = rows.len();
        match self.remote.upsert_notes(rows).await {
            Ok(()) => {
                tracing::info!("mirrored {} note(s) to remote", count);
                Ok(MirrorStatus::Mirrored { count })
            }
            Err(e) => {
                tracing::error!("remote mirror failed, notes kept locally: {}", e);
                Ok(MirrorStatus::Failed(e))
            }
        }
    }

    /// Fold the guest collection into `username`'s collection. Returns how many
    /// notes moved; zero when there was nothing to merge.
    pub async fn merge_guest_into(&self, username: &str) -> StoreResult<usize> {
        let target = Identity::from_username(Some(username));
        if target.is_guest() {
            return Ok(0);
        }

        let guest_notes = self.cache.notes(&Identity::Guest).await;
        if guest_notes.is_empty() {
            return Ok(0);
        }

        let previous = self.cache.notes(&target).await;
        let merged = guest_notes.len();
        let mut combined = previous.clone();
        combined.extend(guest_notes);

        self.cache.set_notes(&target, &combined).await?;
        if let Err(e) = self.cache.clear_notes(&Identity::Guest).await {
            if let Err(restore) = self.cache.set_notes(&target, &previous).await {
                tracing::error!(
                    "could not undo guest merge into {}, guest notes may merge again: {}",
                    username,
                    restore
                );
            }
            return Err(e);
        }

        tracing::info!("merged {} guest note(s) into {}", merged, username);
        Ok(merged)
    }

    /// Remove one note locally, then from the remote.
    pub async fn delete_note(
        &self,
        identity: &Identity,
        id: &str,
    ) -> Result<MirrorStatus, SaveError> {
        let mut notes = self.cache.notes(identity).await;
        notes.retain(|n| n.id != id);
        self.cache.set_notes(identity, &notes).await?;

        if self.session_for(identity).await.is_none() {
            return Ok(MirrorStatus::Skipped);
        }
        match self.remote.delete_note(id).await {
            Ok(()) => Ok(MirrorStatus::Mirrored { count: 1 }),
            Err(e) => {
                tracing::error!("remote delete of {} failed: {}", id, e);
                Ok(MirrorStatus::Failed(e))
            }
        }
    }

    /// Folders live only remotely; empty without a session or on failure.
    pub async fn load_folders(&self, identity: &Identity) -> Vec<Folder> {
        let Some(session) = self.session_for(identity).await else {
            return Vec::new();
        };
        match self.remote.fetch_folders(&session.user_id).await {
            Ok(rows) => rows.into_iter().map(Folder::from).collect(),
            Err(e) => {
                tracing::warn!("folder fetch failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn save_folder(&self, identity: &Identity, folder: &Folder) -> MirrorStatus {
        let Some(session) = self.session_for(identity).await else {
            return MirrorStatus::Skipped;
        };
        match self
            .remote
            .upsert_folder(RemoteFolder::from_folder(folder, &session.user_id))
            .await
        {
            Ok(()) => MirrorStatus::Mirrored { count: 1 },
            Err(e) => {
                tracing::error!("saving folder {} failed: {}", folder.id, e);
                MirrorStatus::Failed(e)
            }
        }
    }

    pub async fn profile(&self, identity: &Identity) -> Option<Profile> {
        let session = self.session_for(identity).await?;
        match self.remote.fetch_profile(&session.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("profile fetch failed: {}", e);
                None
            }
        }
    }

    /// Publish a read-only copy of `note`. Requires a session.
    pub async fn share_note(&self, identity: &Identity, note: &Note) -> RemoteResult<SharedNote> {
        let session = self
            .session_for(identity)
            .await
            .ok_or(RemoteError::Unauthorized)?;
        self.remote
            .share_note(NewSharedNote {
                title: note.title.clone(),
                content: note.content.clone(),
                user_id: session.user_id,
            })
            .await
    }

    /// Public lookup of a shared note; `None` when missing or unreachable.
    pub async fn shared_note(&self, id: &str) -> Option<SharedNote> {
        match self.remote.get_shared_note(id).await {
            Ok(shared) => shared,
            Err(e) => {
                tracing::warn!("shared note {} unavailable: {}", id, e);
                None
            }
        }
    }
}
