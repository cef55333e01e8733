//! Key-value backends: the "where" of persistence.
//!
//! The session and progress layers never touch a concrete storage API.
//! They are handed something that implements [`KeyValueStore`] and only
//! ever call its four methods. In production that is a thin wrapper over
//! the host's storage; in tests it is a [`MemoryStore`].

use std::collections::HashMap;
use std::sync::Mutex;

use crate::StoreError;

/// A flat string-to-string store, shaped like the browser's `localStorage`.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → one backend is shared (behind an `Arc`) by the
///   session store, the progress store, and the validator.
/// - `'static` → the backend owns its data and lives as long as the app.
///
/// Methods take `&self`, not `&mut self`: the backend is shared, so it is
/// responsible for its own interior mutability. Writes are last-write-wins
/// and there is no cross-key transaction.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`StoreError::QuotaExceeded`] if the store is full.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a key that doesn't exist is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Lists every key currently in the store, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An in-process [`KeyValueStore`] backed by a `HashMap`.
///
/// Used by tests and by headless tools. An optional byte quota makes it
/// fail writes the same way a full browser store does, so the "return
/// `false` on quota exceeded" paths can be exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    /// Maximum total size (keys + values, in bytes). `None` = unlimited.
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Creates an empty, unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that rejects writes once `bytes` would be
    /// exceeded. A quota of 0 rejects every write.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(bytes),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError>
    {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;

        if let Some(limit) = self.quota_bytes {
            // Size of everything else, plus the entry we're about to write.
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let store = MemoryStore::new();
        store.set("k", "old").unwrap();
        store.set("k", "new").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("ghost").is_ok());
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_lists_everything() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_set_past_quota_returns_quota_exceeded() {
        let store = MemoryStore::with_quota(8);
        store.set("ab", "cd").unwrap(); // 4 bytes

        let result = store.set("ef", "ghijk"); // 4 + 7 = 11 > 8

        assert!(
            matches!(result, Err(StoreError::QuotaExceeded { limit: 8, .. })),
            "write past quota should fail, got {result:?}"
        );
        assert_eq!(store.get("ef").unwrap(), None);
    }

    #[test]
    fn test_set_overwrite_counts_only_new_size() {
        // Replacing a value shouldn't count the old value against the quota.
        let store = MemoryStore::with_quota(6);
        store.set("k", "12345").unwrap();
        assert!(store.set("k", "abcde").is_ok());
    }

    #[test]
    fn test_zero_quota_rejects_every_write() {
        let store = MemoryStore::with_quota(0);
        assert!(store.set("k", "").is_err());
    }
}
