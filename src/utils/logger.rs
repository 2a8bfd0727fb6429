use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize tracing according to the logging config. Call once at startup;
/// older `log`-based calls from dependencies are bridged into tracing.
pub fn init_logging(logging_config: &LoggingConfig) {
    // Parse level string -> LevelFilter
    let level_filter = match logging_config.level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            panic!(
                "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
                logging_config.level
            );
        }
    };

    // This can be used to allow env-based overrides, plus the default:
    let filter_layer = EnvFilter::default().add_directive(level_filter.into());

    let _ = tracing_log::LogTracer::init();

    match logging_config.format.to_lowercase().as_str() {
        "json" => {
            // Structured JSON output
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().json())
                .init();
        }
        "console" => {
            // Human-readable console output with ANSI colors
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().pretty())
                .init();
        }
        _ => {
            // Fallback to console if unknown
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
