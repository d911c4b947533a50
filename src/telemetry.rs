use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info";

/// Initialize logging
///
/// Logs go to stdout unless `enabled` is set, in which case they are appended
/// to the file at `log_path` (`~` expanded).
///
/// # Errors
/// Returns error if the log file or its directory cannot be created
pub fn init(enabled: bool, log_path: &str) -> Result<()> {
    if !enabled {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(false)
            .init();
        return Ok(());
    }

    let expanded_path = Config::expand_path(log_path)?;
    let file = open_log_file(&expanded_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(file)
        .with_target(false)
        .with_ansi(false)
        .init();

    tracing::info!("telemetry initialized: {}", expanded_path.display());

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Open `path` for appending, creating parent directories as needed
fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("failed to open log file")
}

/// Resolved log file location for a config
///
/// # Errors
/// Returns error if `HOME` is needed but not set
pub fn log_file_path(config: &Config) -> Result<Option<PathBuf>> {
    if config.telemetry_enabled {
        Config::expand_path(&config.log_path).map(Some)
    } else {
        Ok(None)
    }
}
