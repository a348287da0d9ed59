// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connector lifecycle: startup, shutdown, recovery.

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use tp_adapters::{LockError, PidLock};
use tp_ipc::socket;

/// Connector configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/telepresence).
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    /// Fixed paths under the per-user state directory; the socket path
    /// honors `TELEPRESENCE_USER_DAEMON_ADDRESS`.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = match std::env::var("TELEPRESENCE_CONNECTOR_DIR")
            .ok()
            .filter(|v| !v.is_empty())
        {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(dirs::cache_dir)
                .ok_or(LifecycleError::NoStateDir)?
                .join("telepresence"),
        };

        Ok(Self {
            socket_path: socket::connector_socket(),
            lock_path: state_dir.join("connector.pid"),
            version_path: state_dir.join("connector.version"),
            log_path: state_dir.join("connector.log"),
            state_dir,
        })
    }
}

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine the state directory")]
    NoStateDir,

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

/// Acquire the lock, record the version, then bind the socket.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let lock = PidLock::acquire(&config.lock_path)?;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    let listener = socket::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(socket = %config.socket_path.display(), "connector listening");
    Ok(StartupResult { listener, lock })
}

/// Remove socket, version, and PID files. The listener never unlinks
/// its socket on close; this is the explicit removal.
pub fn shutdown(config: &Config, lock: PidLock) {
    for path in [&config.socket_path, &config.version_path] {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), "failed to remove file: {}", e);
            }
        }
    }
    lock.release();
    info!("connector shutdown complete");
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
