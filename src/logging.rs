//! Log setup: console output plus one timestamped file per run

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Path of the log file for a run started now
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("scraper_{}.log", Local::now().format("%Y%m%d_%H%M%S")))
}

fn open_log_file(log_dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let path = log_file_path(log_dir);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    Ok((file, path))
}

/// Install the global subscriber.
///
/// The filter defaults to `info` and honours `RUST_LOG`. When the log file
/// cannot be opened the run continues with console logging only.
pub fn init(log_dir: &Path) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let console = fmt::layer().with_target(true);

    match open_log_file(log_dir) {
        Ok((file, path)) => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file));

            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            Ok(Some(path))
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            warn!("File logging disabled: {:#}", e);
            Ok(None)
        }
    }
}
