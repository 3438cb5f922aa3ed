//! Logging initialization for client hosts.

use crate::Paths;
use observability::{LogConfig, LogOutput};

const ENV_OBS_MODE: &str = "COUPON_CLIENT_OBS_MODE";

/// Initialize tracing for the embedding application.
///
/// `COUPON_CLIENT_OBS_MODE=file` writes JSONL to `<base>/logs/client.jsonl`
/// (mirrored to stderr); anything else logs compactly to stderr.
/// `RUST_LOG` overrides `level` in both modes.
pub fn init_logging(service_name: &str, level: &str, paths: &Paths) {
    let output = output_from_mode(std::env::var(ENV_OBS_MODE).ok().as_deref());

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        output,
        log_path: Some(paths.log_file()),
        also_stderr: true,
    });
}

fn output_from_mode(mode: Option<&str>) -> LogOutput {
    match mode.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
        Some("file") | Some("jsonl") => LogOutput::JsonFile,
        _ => LogOutput::Compact,
    }
}

/// Parse a log level string, falling back to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
