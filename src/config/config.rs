use figment::providers::{Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: API endpoints, token store backend and logging.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Load config from a YAML file named "config.yaml" in the current directory.
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new().merge(Yaml::file("./config.yaml"));
    let config = match figment.extract::<Config>() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    match config {
        Config::ConfigV1(c) => c,
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}

/// Everything needed to reach the MetaScan backend.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. "https://api.example.com/api/".
    pub base_url: String,
    /// Login endpoint, relative to `base_url`.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Token refresh endpoint, relative to `base_url`.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Paths dispatched without a bearer token and whose 401s are never
    /// treated as session expiry (registration, password reset, ...).
    /// The login and refresh paths are always included implicitly.
    #[serde(default)]
    pub open_paths: Vec<String>,
    /// Path prefixes of downstream integrations whose 401s concern their
    /// own credentials, not our session (e.g. the Sankhya ERP proxy).
    #[serde(default = "default_upstream_paths")]
    pub upstream_paths: Vec<String>,
    /// Per-request timeout applied to the underlying HTTP client.
    pub timeout_in_ms: Option<u64>,
}

fn default_login_path() -> String {
    "login/".to_string()
}

fn default_refresh_path() -> String {
    "token/refresh/".to_string()
}

fn default_upstream_paths() -> Vec<String> {
    vec!["sankhya/".to_string()]
}

impl ApiConfig {
    /// Join a relative path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
