use std::{
    fs::{self, File, OpenOptions},
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use crate::config::LogSettings;

/// Returns the level to use, and whether the configured one had to be ignored
pub fn level(configured: &str, debug: bool) -> (LevelFilter, bool) {
    let (level, invalid) = match configured.parse::<LevelFilter>() {
        Ok(l) => (l, false),
        Err(_) => (LevelFilter::INFO, true),
    };
    match debug {
        true => (LevelFilter::DEBUG, invalid),
        false => (level, invalid),
    }
}

pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Logs to stdout, and also to `log.path` when set
pub fn init(log: &LogSettings, debug: bool) -> anyhow::Result<()> {
    let (level, invalid_level) = level(&log.level, debug);
    let (file, file_err) = match log.path.as_str() {
        "" => (None, None),
        path => match open_log_file(Path::new(path)) {
            Ok(f) => (Some(Arc::new(f)), None),
            Err(e) => (None, Some(e)),
        },
    };

    let registry = tracing_subscriber::registry().with(level);
    match log.format.as_str() {
        "json" => registry
            .with(fmt::layer().json())
            .with(file.map(|f| fmt::layer().json().with_writer(f)))
            .try_init(),
        _ => registry
            .with(fmt::layer())
            .with(file.map(|f| fmt::layer().with_ansi(false).with_writer(f)))
            .try_init(),
    }
    .context("installing the tracing subscriber")?;

    if invalid_level {
        tracing::warn!(level = %log.level, fallback = "info", "invalid log level");
    }
    if debug {
        tracing::debug!("debug logs enabled");
    }
    if let Some(err) = file_err {
        tracing::warn!("logging to stdout only: {err:#}");
    }
    Ok(())
}
