//! tracing subscriber setup.

use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

const DEFAULT_FILTER: &str = "folio=warn";
const DEBUG_FILTER: &str = "folio=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. The returned guard flushes the
/// log file and must live until the program exits.
pub fn init(config: &LoggingConfig, debug: bool) -> Result<Option<WorkerGuard>> {
  let filter = build_filter(config.filter.as_deref(), debug)?;

  match &config.file {
    Some(path) => {
      let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
      fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;
      Ok(Some(guard))
    }
    None => {
      fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;
      Ok(None)
    }
  }
}

fn build_filter(configured: Option<&str>, debug: bool) -> Result<EnvFilter> {
  if let Ok(filter) = EnvFilter::try_from_default_env() {
    return Ok(filter);
  }
  let directive = configured.unwrap_or(if debug { DEBUG_FILTER } else { DEFAULT_FILTER });
  EnvFilter::try_new(directive).map_err(|e| eyre!("Invalid log filter '{}': {}", directive, e))
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create log directory {}: {}", parent.display(), e))?;
  }
  std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))
}
