use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::utils::config::Config;

/// `~/.greenchoice/logs/latest.log`
pub fn default_log_path() -> PathBuf {
    Config::get_config_dir().join("logs").join("latest.log")
}

/// Filter from `RUST_LOG` when set, otherwise from `level`
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global tracing subscriber, appending to `path`.
///
/// Logs go to a file so they never interleave with the chat transcript.
pub fn init_global_logger(path: &Path, level: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Logger already initialized: {}", e))?;

    Ok(())
}
