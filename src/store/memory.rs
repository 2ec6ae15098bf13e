//! In-memory store (tests, throwaway sessions)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{KeyValueStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    /// When set, every operation fails as if the backend were gone.
    unavailable: bool,
    /// When set, reads succeed and writes fail.
    read_only: AtomicBool,
    /// Writes to this one key fail; everything else works.
    failing_key: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails with `StoreError::Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Toggles write failures (simulates a full disk or revoked quota).
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Makes writes to `key` fail (e.g. only the selection write).
    pub fn fail_writes_to(&self, key: &str) {
        if let Ok(mut failing) = self.failing_key.lock() {
            *failing = Some(key.to_string());
        }
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw read that bypasses the trait (for assertions).
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        let values = self
            .values
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is read-only".to_string()));
        }
        if let Ok(failing) = self.failing_key.lock() {
            if failing.as_deref() == Some(key) {
                return Err(StoreError::Unavailable(format!("writes to {} fail", key)));
            }
        }
        let mut values = self
            .values
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_counts_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();

        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_unavailable_store_fails() {
        let store = MemoryStore::unavailable();
        assert!(matches!(store.get("a"), Err(StoreError::Unavailable(_))));
        assert!(store.set("a", "1").is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_read_only_keeps_previous_value() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set_read_only(true);

        assert!(store.set("a", "2").is_err());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_failing_key_only_blocks_that_key() {
        let store = MemoryStore::new();
        store.fail_writes_to("b");

        store.set("a", "1").unwrap();
        assert!(store.set("b", "1").is_err());
        assert_eq!(store.raw("b"), None);
        assert_eq!(store.write_count(), 1);
    }
}
