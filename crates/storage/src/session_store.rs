//! Short-lived key-value storage scoped to one browsing session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::repository::StorageError;

/// Session-scoped string store, the shape of a browser's `sessionStorage`.
///
/// Calls are synchronous; values vanish when the session ends.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::QuotaExceeded` when the value does not fit, or
    /// `StorageError::Unavailable` when storage is disabled.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Drop every entry, as happens when the session ends.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// In-process session store with an optional byte quota.
///
/// The quota counts key and value bytes of all entries, like browser storage.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

impl KeyValueStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = guard
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        guard.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.lock()?.clear();
        Ok(())
    }
}

/// Store that refuses every access, as when the browser disables storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledSessionStore;

impl KeyValueStore for DisabledSessionStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("session storage disabled".into()))
    }

    fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("session storage disabled".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("session storage disabled".into()))
    }

    fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("session storage disabled".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = InMemorySessionStore::new();
        store.set("k", "v".into()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn quota_counts_keys_and_values_and_allows_overwrite() {
        let store = InMemorySessionStore::new().with_quota(10);
        store.set("ab", "cdef".into()).unwrap();
        // replacing the same key does not double count it
        store.set("ab", "cdefgh".into()).unwrap();

        let err = store.set("x", "yz".into()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 3,
                available: 2
            }
        ));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn clear_empties_the_session() {
        let store = InMemorySessionStore::new();
        store.set("a", "1".into()).unwrap();
        store.set("b", "2".into()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn disabled_store_rejects_writes() {
        let err = DisabledSessionStore.set("a", "1".into()).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
