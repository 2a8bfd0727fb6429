use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::TokenStore;

/// Config for the file-backed store.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct FileStoreConfig {
    /// Path of the JSON file holding the session map.
    pub path: String,
}

/// A durable store backed by a JSON object on disk, so the session survives
/// restarts. The whole map is rewritten on every mutation; entries are small
/// (a handful of tokens and cached claims).
///
/// Disk failures are logged and swallowed: the in-memory copy keeps the
/// session alive for the current process and auth flows never see an I/O
/// error.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn new(config: &FileStoreConfig) -> Self {
        let path = PathBuf::from(&config.path);
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => {
                    debug!("Loaded {} session entries from '{}'", map.len(), config.path);
                    map
                }
                Err(e) => {
                    warn!("Session file '{}' is corrupt, starting empty: {}", config.path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        FileStore {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let serialized = match serde_json::to_string(entries) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize session state: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, serialized) {
            warn!(
                "Failed to persist session state to '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("token store mutex poisoned");
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().expect("token store mutex poisoned");
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("token store mutex poisoned");
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}
