// Logging setup: a tracing subscriber writing to a file in the home
// directory, filtered by RUST_LOG.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Directory under the home directory holding the client's log file.
const LOG_DIR: &str = ".tunefinder";

pub fn log_file_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(LOG_DIR).join("tunefinder.log")
}

/// Initialize structured logging to `~/.tunefinder/tunefinder.log`.
///
/// Logs go to a file so they never interleave with the interactive menu.
pub fn init_logging() -> Result<PathBuf> {
    let log_file_path = log_file_path();
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .context("Failed to open log file")?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tunefinder_cli=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("tunefinder logging initialized at {}", log_file_path.display());

    Ok(log_file_path)
}
