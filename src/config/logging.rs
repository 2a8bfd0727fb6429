use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How `utils::init_logging` sets up the tracing subscriber.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct LoggingConfig {
    /// Minimum level to emit, "trace" through "error".
    pub level: String,
    /// "json" for machine-readable output, "console" for a human one.
    pub format: String,
}
