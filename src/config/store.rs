use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::file_store::FileStoreConfig;

/// A wrapper for the token store configuration. The backend decides where
/// session state lives between runs.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct StoreConfig {
    #[serde(flatten)]
    pub backend: StoreBackend,
}

/// The available store backends. We differentiate them via a "type" tag
/// in the YAML.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
#[serde(tag = "type")]
pub enum StoreBackend {
    /// Durable JSON file, survives restarts.
    #[serde(rename = "file")]
    File(FileStoreConfig),
    /// In-memory only; the session dies with the process.
    #[serde(rename = "memory")]
    Memory,
}
