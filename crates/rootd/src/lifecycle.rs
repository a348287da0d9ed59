// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Root daemon lifecycle: startup, shutdown, cleanup.

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use tp_adapters::{LockError, PidLock};
use tp_ipc::socket;

/// Root daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the PID file and log (e.g. /var/run).
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    /// Fixed paths, overridable for tests via `TELEPRESENCE_ROOTD_DIR`.
    pub fn load() -> Self {
        let state_dir = std::env::var("TELEPRESENCE_ROOTD_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/var/run"));

        Self {
            socket_path: socket::root_socket(),
            lock_path: state_dir.join("telepresence-rootd.pid"),
            log_path: state_dir.join("telepresence-rootd.log"),
            state_dir,
        }
    }
}

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, tp_ipc::WireError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful startup.
#[derive(Debug)]
pub struct StartupResult {
    pub listener: UnixListener,
    pub lock: PidLock,
}

/// Acquire the lock, then bind the socket.
///
/// The lock comes first: replacing a leftover socket file is only safe
/// once we know no other root daemon is alive.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let lock = PidLock::acquire(&config.lock_path)?;

    let listener = socket::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(socket = %config.socket_path.display(), "root daemon listening");
    Ok(StartupResult { listener, lock })
}

/// Remove the socket and PID files. The listener never unlinks its
/// socket on close; this is the explicit removal.
pub fn shutdown(config: &Config, lock: PidLock) {
    if config.socket_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.socket_path) {
            warn!("failed to remove socket file: {}", e);
        }
    }
    lock.release();
    info!("root daemon shutdown complete");
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
