// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known socket endpoints.
//!
//! The user daemon (connector) serves the CLI; the root daemon serves the
//! user daemon. On Windows these would be named pipes under the per-user
//! cache directory; this tree is Unix-socket only.

use std::path::PathBuf;

use tokio::net::UnixListener;

use crate::wire::WireError;

/// Default path of the user-daemon socket.
pub const CONNECTOR_SOCKET: &str = "/tmp/telepresence-connector.socket";

/// Default path of the root-daemon socket.
pub const ROOT_SOCKET: &str = "/var/run/telepresence-daemon.socket";

/// The user-daemon socket path, honoring `TELEPRESENCE_USER_DAEMON_ADDRESS`.
pub fn connector_socket() -> PathBuf {
    std::env::var("TELEPRESENCE_USER_DAEMON_ADDRESS")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONNECTOR_SOCKET))
}

/// The root-daemon socket path, honoring `TELEPRESENCE_ROOT_DAEMON_ADDRESS`.
pub fn root_socket() -> PathBuf {
    std::env::var("TELEPRESENCE_ROOT_DAEMON_ADDRESS")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(ROOT_SOCKET))
}

/// Bind a listening socket, replacing a pre-existing file.
///
/// Callers must hold their PID lock first: the file being replaced here
/// either belongs to a daemon that exited ungracefully or was already
/// recovered by a dialer. The listener never unlinks the file on close;
/// the daemon removes it explicitly at exit.
pub fn bind(path: &std::path::Path) -> Result<UnixListener, WireError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(UnixListener::bind(path)?)
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
