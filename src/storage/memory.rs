//! In-memory storage backing.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::StorageBackend;

/// A process-local key-value store.
///
/// Used in tests and for callers that only want throttling within one
/// process lifetime. State does not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.get("k").is_none());

        assert!(storage.set("k", "v"));
        assert_eq!(storage.get("k").as_deref(), Some("v"));
        assert_eq!(storage.len(), 1);

        storage.remove("k");
        assert!(storage.get("k").is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_keys_are_independent() {
        let storage = MemoryStorage::new();
        storage.set("a", "1");
        storage.set("b", "2");

        storage.remove("a");
        assert_eq!(storage.get("b").as_deref(), Some("2"));
    }
}
