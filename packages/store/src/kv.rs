//! # Key-value persistence trait
//!
//! [`KeyValueStore`] is the seam between the typed [`crate::LocalCache`] and whatever
//! actually holds the bytes. Keys are flat strings such as
//! `"notesWorkspace.notes.guest"`; values are JSON text produced by the cache.
//!
//! Reads never fail: a missing or unreadable entry is `None`. Writes report
//! failure so the write path can tell a committed save from a lost one.
//! Implementations: [`crate::MemoryStore`], [`crate::FileStore`].

use std::future::Future;

use crate::error::StoreResult;

/// Async string-keyed storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Option<String>>;

    /// Replace the value under `key`. Must either store the whole value or
    /// leave the previous one in place.
    fn set(&self, key: &str, value: String) -> impl Future<Output = StoreResult<()>>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = StoreResult<()>>;
}
