//! Structured logging setup.
//!
//! Thin wrapper over `tracing-subscriber` so embedding applications get
//! the same log shape in development (text) and production (JSON).
//! Respects `RUST_LOG` when set.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// JSON output (production) instead of human-readable text.
    pub json_format: bool,
    /// Default level when `RUST_LOG` is not set.
    pub default_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
        }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self { json_format: true, ..Default::default() }
    }

    pub fn text() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }
}

/// Installs the global subscriber. Safe to call more than once; later
/// calls are no-ops (relevant for tests sharing a process).
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()));

    if config.json_format {
        let _ = fmt().json().with_env_filter(filter).try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
