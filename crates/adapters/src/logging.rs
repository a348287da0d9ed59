// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon logging: non-blocking file appender, size-based rotation, and
//! a runtime-adjustable level with optional expiry.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Errors during logging setup.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("log path has no parent directory: {0}")]
    NoParent(std::path::PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log level: {0}")]
    BadLevel(String),
}

/// Handle for the `set-log-level` admin call.
#[derive(Clone)]
pub struct LogLevelHandle {
    reload: reload::Handle<EnvFilter, tracing_subscriber::Registry>,
    base: String,
}

impl LogLevelHandle {
    /// Change the level, optionally reverting after `duration`.
    pub fn set(&self, level: &str, duration: Option<Duration>) -> Result<(), LoggingError> {
        let filter = parse_level(level)?;
        self.reload
            .reload(filter)
            .map_err(|e| LoggingError::BadLevel(e.to_string()))?;
        info!(level, "log level changed");

        if let Some(duration) = duration {
            let handle = self.reload.clone();
            let base = self.base.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                match EnvFilter::try_new(&base) {
                    Ok(filter) => {
                        if handle.reload(filter).is_ok() {
                            info!(level = %base, "log level expired, restored");
                        }
                    }
                    Err(e) => warn!(error = %e, "could not restore log level"),
                }
            });
        }
        Ok(())
    }
}

fn parse_level(level: &str) -> Result<EnvFilter, LoggingError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(EnvFilter::new(level)),
        other => Err(LoggingError::BadLevel(other.to_string())),
    }
}

/// Set up file logging with a reloadable level filter.
///
/// The returned guard must be held for the life of the process; dropping
/// it flushes and stops the background writer.
pub fn setup_logging(
    log_path: &Path,
    level: &str,
) -> Result<(tracing_appender::non_blocking::WorkerGuard, LogLevelHandle), LoggingError> {
    let parent = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParent(log_path.to_path_buf()))?;
    std::fs::create_dir_all(parent)?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| LoggingError::NoParent(log_path.to_path_buf()))?;
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = parse_level(level)?;
    let (filter, reload_handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok((
        guard,
        LogLevelHandle {
            reload: reload_handle,
            base: level.to_string(),
        },
    ))
}

/// Rotate the log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    // Shift older rotations: .3 is deleted, .2→.3, .1→.2
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Write the startup marker before tracing is up, so the CLI can find
/// where the current startup attempt begins in the log.
pub fn write_startup_marker(log_path: &Path, daemon: &str) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(
        file,
        "--- {}: starting (pid: {}) ---\n",
        daemon,
        std::process::id()
    )?;
    Ok(())
}

/// Write a startup error synchronously so it is visible to the CLI even
/// if the process exits before the non-blocking writer flushes.
pub fn write_startup_error(log_path: &Path, error: &dyn std::fmt::Display) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
