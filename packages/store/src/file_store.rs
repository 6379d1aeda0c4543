//! # Filesystem-backed key-value store
//!
//! [`FileStore`] is a [`KeyValueStore`] implementation that keeps each key in its
//! own file under a base directory. It is used on desktop to retain notes,
//! accounts and preferences across restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── notesWorkspace.notes.guest        # JSON array of notes
//! ├── notesWorkspace.notes.alice
//! ├── notesWorkspace.notes.alice.tags
//! ├── notesWorkspace.accounts.v1
//! └── notesWorkspace.activeUser
//! ```
//!
//! Characters outside `[A-Za-z0-9._-]` in a key are percent-encoded so user
//! names can never escape the base directory.
//!
//! ## Atomicity
//!
//! Writes go to an anonymous [`NamedTempFile`] in the base directory and are
//! then persisted over the target, so a crash mid-write leaves either the old
//! collection or the new one, never a truncated file. Temp names are chosen by
//! `tempfile` with exclusive creation and cannot land on another key's file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::StoreResult;
use crate::kv::KeyValueStore;

/// Filesystem-backed KeyValueStore for desktop persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base.join(encode_key(key))
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    // "." and ".." alone would resolve to directories
    if out.chars().all(|c| c == '.') {
        out = out.replace('.', "%2E");
    }
    out
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.entry_path(key)).ok()
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        std::fs::create_dir_all(&self.base)?;
        let mut tmp = NamedTempFile::new_in(&self.base)?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        // On failure the temp file is dropped and removed with the error
        tmp.persist(self.entry_path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
