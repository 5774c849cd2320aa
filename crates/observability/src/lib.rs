//! # Observability
//!
//! Tracing initialisation for the `gtee` binary.
//!
//! Standard output carries the copied stream and standard error carries the
//! diagnostics, so the subscriber always writes to stderr and stays silent
//! unless a level is requested.
//!
//! ## Usage
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig {
//!     default_log_level: "debug".to_string(),
//!     ..Default::default()
//! })?;
//! ```

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable holding an `EnvFilter` directive that overrides the level
pub const LOG_ENV: &str = "GTEE_LOG";

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Default log level, used when `GTEE_LOG` is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            default_log_level: "off".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Map a `-v` count to a level: 0 off, 1 info, 2 debug, 3+ trace
    pub fn from_verbosity(verbose: u8, log_format: LogFormat) -> Self {
        let level = match verbose {
            0 => "off",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            log_format,
            default_log_level: level.to_string(),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

/// Initialize tracing with the given configuration
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.default_log_level))
        .with_context(|| format!("Invalid log level '{}'", config.default_log_level))?;

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        "Observability initialized"
    );

    Ok(())
}
