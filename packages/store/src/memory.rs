use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{StoreError, StoreResult};
use crate::kv::KeyValueStore;

/// In-memory KeyValueStore for testing and as a fallback when no data
/// directory is available.
///
/// Clones share the same map, so a test can keep a handle while the cache owns
/// another one.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    read_only: Arc<AtomicBool>,
    fail_removes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, as a full or locked browser storage would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Make only `remove` fail, leaving `set` working.
    pub fn set_fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    /// Keys currently present, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is read-only".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.check_writable()?;
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.check_writable()?;
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("remove rejected".into()));
        }
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get("a").await.is_none());

        store.set("a", "1".into()).await.unwrap();
        assert_eq!(store.get("a").await.as_deref(), Some("1"));

        store.remove("a").await.unwrap();
        assert!(store.get("a").await.is_none());

        // Removing again is fine
        store.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.set("k", "v".into()).await.unwrap();
        assert_eq!(handle.keys(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes_and_keeps_data() {
        let store = MemoryStore::new();
        store.set("k", "old".into()).await.unwrap();

        store.set_read_only(true);
        assert!(store.set("k", "new".into()).await.is_err());
        assert!(store.remove("k").await.is_err());
        assert_eq!(store.get("k").await.as_deref(), Some("old"));

        store.set_read_only(false);
        store.set("k", "new".into()).await.unwrap();
        assert_eq!(store.get("k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_failing_removes_still_allow_writes() {
        let store = MemoryStore::new();
        store.set_fail_removes(true);
        store.set("k", "v".into()).await.unwrap();
        assert!(store.remove("k").await.is_err());
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
    }
}
