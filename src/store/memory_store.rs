use std::collections::HashMap;
use std::sync::Mutex;

use super::TokenStore;

/// An in-memory store. Session state is lost when the process exits;
/// useful for tests and for embedders that manage persistence themselves.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("token store mutex poisoned");
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().expect("token store mutex poisoned");
        entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("token store mutex poisoned");
        entries.remove(key);
    }
}
