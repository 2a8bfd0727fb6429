use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use metascan_client::api::ApiClient;
use metascan_client::auth::{AuthClient, ExpiryNotifier, SessionController};
use metascan_client::config::{Config, ConfigV1};
use metascan_client::store::create_store;

/// Build a full config pointed at the given (mock) server, parsed through
/// the same figment pipeline production uses.
pub fn load_test_config(base_url: &str, store_yaml: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{base_url}"
  open_paths:
    - "register/"
  upstream_paths:
    - "sankhya/"
store:
{store_yaml}
logging:
  level: "debug"
  format: "console"
"#
    );

    let config: Config = Figment::new()
        .merge(Yaml::string(&yaml))
        .extract()
        .expect("Failed to parse test config YAML");

    match config {
        Config::ConfigV1(cfg) => cfg,
    }
}

pub fn memory_store_yaml() -> String {
    "  type: \"memory\"".to_string()
}

pub fn file_store_yaml(path: &str) -> String {
    format!("  type: \"file\"\n  path: \"{path}\"")
}

/// Notifier double that counts expiry notices and always acknowledges.
pub struct CountingNotifier {
    invocations: AtomicUsize,
}

impl CountingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(CountingNotifier {
            invocations: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExpiryNotifier for CountingNotifier {
    async fn session_expired(&self) -> bool {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// Wire the whole client stack from a config, the way an embedder would.
pub fn build_client(
    config: &ConfigV1,
    notifier: Arc<CountingNotifier>,
) -> (ApiClient, Arc<SessionController>) {
    let store = create_store(&config.store);
    let session = Arc::new(SessionController::new(
        AuthClient::new(&config.api),
        store,
    ));
    let client = ApiClient::new(&config.api, session.clone(), notifier);
    (client, session)
}
