use std::sync::Arc;

use tracing::info;

use super::{file_store::FileStore, memory_store::MemoryStore};
use crate::config::{StoreBackend, StoreConfig};

/// Logical keys under which session state is persisted. Written together on
/// login/refresh, cleared together on logout.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "token";
    pub const REFRESH_TOKEN: &str = "refresh";
    pub const USER_ROLE: &str = "userRole";
    pub const USER_ID: &str = "userId";
    pub const USER_EMAIL: &str = "userEmail";

    /// Every key, for a full clear on logout.
    pub const ALL: [&str; 5] = [ACCESS_TOKEN, REFRESH_TOKEN, USER_ROLE, USER_ID, USER_EMAIL];
}

/// The TokenStore trait abstracts session-state persistence (get, set,
/// remove). It performs no validation; the session controller enforces the
/// token-pairing invariant before writing.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Creates a concrete store implementation based on the StoreConfig.
pub fn create_store(config: &StoreConfig) -> Arc<dyn TokenStore> {
    match &config.backend {
        StoreBackend::File(file_config) => {
            info!("Using file token store at '{}'.", file_config.path);
            Arc::new(FileStore::new(file_config))
        }
        StoreBackend::Memory => {
            info!("Using in-memory token store.");
            Arc::new(MemoryStore::new())
        }
    }
}
