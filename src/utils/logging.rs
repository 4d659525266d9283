//! Structured logging setup driven by [`LoggingConfig`].
//!
//! Honors `RUST_LOG` when set; otherwise derives a default directive from
//! the configured application name and level.

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns a `ConfigError` if a log file cannot be opened or a subscriber
/// is already installed.
pub fn init(cfg: &LoggingConfig) -> Result<()> {
    let directive = format!("{}={}", cfg.app_name.replace('-', "_"), cfg.log_level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match (cfg.json_format, cfg.log_to_file) {
        (false, false) => builder.try_init(),
        (true, false) => builder.json().try_init(),
        (false, true) => builder.with_writer(open_log_file(cfg)?).try_init(),
        (true, true) => builder.json().with_writer(open_log_file(cfg)?).try_init(),
    };

    installed
        .map_err(|e| ProtocolError::ConfigError(format!("Failed to install subscriber: {e}")))
}

fn open_log_file(cfg: &LoggingConfig) -> Result<Arc<std::fs::File>> {
    let path = cfg.log_file_path.as_deref().ok_or_else(|| {
        ProtocolError::ConfigError("log_file_path required when log_to_file is set".to_string())
    })?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ProtocolError::ConfigError(format!("Failed to open log file: {e}")))?;

    Ok(Arc::new(file))
}
