//! # REST remote — [`store::RemoteStore`] over a PostgREST-style HTTP API
//!
//! [`RestRemote`] talks to a hosted Postgres exposed through PostgREST plus a
//! GoTrue-compatible auth endpoint:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | password sign-in | `POST /auth/v1/token?grant_type=password` |
//! | sign-out | `POST /auth/v1/logout` |
//! | fetch notes | `GET /rest/v1/notes?user_id=eq.<owner>&order=updated_at.desc` |
//! | upsert notes | `POST /rest/v1/notes` with `Prefer: resolution=merge-duplicates` |
//! | delete note | `DELETE /rest/v1/notes?id=eq.<id>` |
//! | folders | `GET` / upsert `POST /rest/v1/folders` |
//! | profile | `GET /rest/v1/profiles?id=eq.<user>` |
//! | share | `POST /rest/v1/shared_notes` with `Prefer: return=representation` |
//! | shared note | `GET /rest/v1/shared_notes?id=eq.<id>` (anon key only) |
//!
//! Every request carries the `apikey` header. Authenticated requests add
//! `Authorization: Bearer <access_token>` from the in-memory [`Session`]; without
//! a session the anon key is used as the bearer.
//!
//! ## Error mapping
//!
//! Transport failures (DNS, refused connection, timeout) become
//! [`RemoteError::Network`], `401`/`403` become [`RemoteError::Unauthorized`], any
//! other non-success status becomes [`RemoteError::Status`], and undecodable
//! bodies become [`RemoteError::Decode`]. The sync layer treats them all as
//! "fall back to local".

use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use store::{
    NewSharedNote, Profile, RemoteError, RemoteFolder, RemoteNote, RemoteResult, RemoteStore,
    Session, SharedNote,
};

use crate::auth::RemoteConfig;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// HTTP client for the hosted note store.
pub struct RestRemote {
    config: RemoteConfig,
    client: Client,
    session: Mutex<Option<Session>>,
}

impl RestRemote {
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            config,
            client,
            session: Mutex::new(None),
        })
    }

    /// Resume a session persisted elsewhere.
    pub fn restore_session(&self, session: Session) {
        *self.lock_session() = Some(session);
    }

    /// Exchange email + password for a session and keep it.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> RemoteResult<Session> {
        let resp = self
            .client
            .post(self.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(network)?;
        let token: TokenResponse = decode(check(resp).await?).await?;

        let session = Session {
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
        };
        *self.lock_session() = Some(session.clone());
        tracing::info!("signed in to remote as {}", session.user_id);
        Ok(session)
    }

    /// Drop the local session and tell the server, ignoring server errors.
    pub async fn sign_out(&self) {
        let Some(session) = self.lock_session().take() else {
            return;
        };
        let result = self
            .client
            .post(self.endpoint("/auth/v1/logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!("remote sign-out failed: {}", e);
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    fn table(&self, table: &str) -> String {
        self.endpoint(&format!("/rest/v1/{table}"))
    }

    /// Attach the API key and the best available bearer token.
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .lock_session()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone());
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> RemoteResult<Vec<T>> {
        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());
        let resp = self
            .authed(self.client.get(self.table(table)))
            .query(&query)
            .send()
            .await
            .map_err(network)?;
        decode(check(resp).await?).await
    }

    async fn upsert<T: serde::Serialize>(&self, table: &str, rows: &T) -> RemoteResult<()> {
        let resp = self
            .authed(self.client.post(self.table(table)))
            .header("Prefer", "resolution=merge-duplicates")
            .json(rows)
            .send()
            .await
            .map_err(network)?;
        check(resp).await?;
        Ok(())
    }

    fn require_session(&self) -> RemoteResult<Session> {
        self.lock_session().clone().ok_or(RemoteError::Unauthorized)
    }
}

fn network(e: reqwest::Error) -> RemoteError {
    RemoteError::Network(e.to_string())
}

async fn check(resp: Response) -> RemoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RemoteError::Unauthorized);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> RemoteResult<T> {
    resp.json::<T>()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

impl RemoteStore for RestRemote {
    async fn current_session(&self) -> RemoteResult<Option<Session>> {
        Ok(self.lock_session().clone())
    }

    async fn fetch_notes(&self, owner_id: &str) -> RemoteResult<Vec<RemoteNote>> {
        self.select(
            "notes",
            &[
                ("user_id", format!("eq.{owner_id}")),
                ("order", "updated_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn upsert_notes(&self, notes: Vec<RemoteNote>) -> RemoteResult<()> {
        self.require_session()?;
        if notes.is_empty() {
            return Ok(());
        }
        self.upsert("notes", &notes).await
    }

    async fn delete_note(&self, id: &str) -> RemoteResult<()> {
        self.require_session()?;
        let resp = self
            .authed(self.client.delete(self.table("notes")))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(network)?;
        check(resp).await?;
        Ok(())
    }

    async fn fetch_folders(&self, owner_id: &str) -> RemoteResult<Vec<RemoteFolder>> {
        self.select("folders", &[("user_id", format!("eq.{owner_id}"))])
            .await
    }

    async fn upsert_folder(&self, folder: RemoteFolder) -> RemoteResult<()> {
        self.require_session()?;
        self.upsert("folders", &folder).await
    }

    async fn fetch_profile(&self, user_id: &str) -> RemoteResult<Option<Profile>> {
        let rows: Vec<Profile> = self
            .select("profiles", &[("id", format!("eq.{user_id}"))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn share_note(&self, note: NewSharedNote) -> RemoteResult<SharedNote> {
        self.require_session()?;
        let resp = self
            .authed(self.client.post(self.table("shared_notes")))
            .header("Prefer", "return=representation")
            .json(&note)
            .send()
            .await
            .map_err(network)?;
        let rows: Vec<SharedNote> = decode(check(resp).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode("insert returned no row".into()))
    }

    async fn get_shared_note(&self, id: &str) -> RemoteResult<Option<SharedNote>> {
        let resp = self
            .client
            .get(self.table("shared_notes"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(network)?;
        let rows: Vec<SharedNote> = decode(check(resp).await?).await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use store::{Identity, LocalCache, MemoryStore, Note, NoteSync, ReadSource, WorkspaceConfig};

    // Nothing listens on the discard port, so every request fails fast.
    fn unreachable() -> RestRemote {
        let config =
            RemoteConfig::new("http://127.0.0.1:9/", "anon").with_timeout(Duration::from_secs(2));
        RestRemote::new(config).unwrap()
    }

    fn session() -> Session {
        Session {
            user_id: "uid-1".into(),
            email: Some("a@x.io".into()),
            access_token: "token".into(),
        }
    }

    #[test]
    fn test_endpoints() {
        let remote = unreachable();
        assert_eq!(remote.table("notes"), "http://127.0.0.1:9/rest/v1/notes");
        assert_eq!(remote.endpoint("/auth/v1/token"), "http://127.0.0.1:9/auth/v1/token");
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let remote = unreachable();
        assert_eq!(remote.current_session().await, Ok(None));
        assert_eq!(
            remote.upsert_notes(vec![]).await,
            Err(RemoteError::Unauthorized)
        );

        remote.restore_session(session());
        assert_eq!(remote.current_session().await, Ok(Some(session())));
        // Empty batches never hit the network
        assert_eq!(remote.upsert_notes(vec![]).await, Ok(()));

        remote.sign_out().await;
        assert_eq!(remote.current_session().await, Ok(None));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let remote = unreachable();
        remote.restore_session(session());
        assert!(matches!(
            remote.fetch_notes("uid-1").await,
            Err(RemoteError::Network(_))
        ));
        assert!(matches!(
            remote.sign_in_with_password("a@x.io", "pw").await,
            Err(RemoteError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_sync_falls_back_to_local_when_endpoint_is_down() {
        let remote = unreachable();
        remote.restore_session(session());
        let cache = LocalCache::new(MemoryStore::new(), &WorkspaceConfig::default());
        let sync = NoteSync::new(cache, remote);
        let alice = Identity::User("alice".into());

        let note = Note::new("offline", "still here");
        let status = sync.save_notes(&alice, &[note.clone()]).await.unwrap();
        assert!(status.is_failed());

        let loaded = sync.load_notes(&alice).await;
        assert_eq!(loaded.source, ReadSource::Local);
        assert_eq!(loaded.notes, vec![note]);
    }
}
