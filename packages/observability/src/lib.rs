//! # Observability
//!
//! Tracing setup shared by every crate of the coupon client.
//!
//! Library crates only emit events through the standard `tracing` macros.
//! The embedding application calls [`init_with_config`] once at startup and
//! picks where events end up:
//!
//! - [`LogOutput::Compact`]: human readable lines on stderr.
//! - [`LogOutput::JsonFile`]: one JSON object per line appended to
//!   `~/.coupon-client/logs/client.jsonl` (or [`LogConfig::log_path`]),
//!   optionally mirrored to stderr.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "mobile".into(),
//!     default_level: "debug".into(),
//!     output: observability::LogOutput::JsonFile,
//!     ..Default::default()
//! });
//! tracing::info!("client ready");
//! ```

mod file_sink;
mod json_layer;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file_sink::{default_log_path, LogFileWriter};
pub use json_layer::{JsonLayer, LogEntry};

/// Where log events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Compact single-line output on stderr.
    #[default]
    Compact,
    /// Structured JSONL appended to the central log file.
    JsonFile,
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the embedding application (e.g. "mobile", "admin").
    /// Written into every JSONL entry.
    pub service_name: String,

    /// Default filter directive. `RUST_LOG` takes precedence when set.
    pub default_level: String,

    /// Output selection.
    pub output: LogOutput,

    /// Custom JSONL file location. Ignored for [`LogOutput::Compact`].
    pub log_path: Option<PathBuf>,

    /// Mirror JSONL output to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "client".into(),
            default_level: "info".into(),
            output: LogOutput::Compact,
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize compact stderr logging for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// A second call is a no-op: the first installed subscriber stays active.
/// If the JSONL file cannot be opened, compact stderr output is used instead.
pub fn init_with_config(config: LogConfig) {
    match config.output {
        LogOutput::Compact => init_compact(&config.default_level),
        LogOutput::JsonFile => {
            if let Err(error) = init_json_file(&config) {
                init_compact(&config.default_level);
                tracing::warn!(%error, "JSONL log file unavailable, using stderr");
            }
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn init_compact(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .compact()
        .try_init();
}

fn init_json_file(config: &LogConfig) -> std::io::Result<()> {
    let log_path = match &config.log_path {
        Some(path) => path.clone(),
        None => default_log_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?,
    };

    let writer = LogFileWriter::open(&log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), writer);

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    let _ = tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter(&config.default_level)))
        .with(stderr_layer)
        .try_init();

    tracing::info!(log_path = %log_path.display(), "observability initialized");
    Ok(())
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "client");
        assert_eq!(config.default_level, "info");
        assert_eq!(config.output, LogOutput::Compact);
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("first");
        init("second");
    }
}
