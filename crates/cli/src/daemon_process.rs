// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Functions for starting and waiting on the connector process.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::client::{ClientError, ConnectorClient};
use tp_ipc::probe;

/// How long to wait for a freshly started connector to bind its socket.
const START_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for the socket.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The connector's file layout, for log hints.
pub fn connector_config() -> Result<tp_daemon::Config, ClientError> {
    tp_daemon::Config::load().map_err(|e| ClientError::StartFailed(e.to_string()))
}

/// Find the connector binary: explicit override, then a sibling of the
/// CLI binary, then `$PATH`.
fn find_connector_binary() -> PathBuf {
    if let Ok(path) = std::env::var("TELEPRESENCE_CONNECTOR_BIN") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("telepresence-connector");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("telepresence-connector")
}

/// Start the connector in the background.
pub fn start_connector_background() -> Result<std::process::Child, ClientError> {
    let binary = find_connector_binary();
    std::process::Command::new(&binary)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::StartFailed(format!("{}: {e}", binary.display())))
}

/// Connect to the user daemon, starting it if it is not running.
pub async fn connect_or_start() -> Result<ConnectorClient, ClientError> {
    let socket_path = tp_ipc::socket::connector_socket();
    if probe(&socket_path) {
        return Ok(ConnectorClient::new(socket_path));
    }

    let mut child = start_connector_background()?;
    let start = Instant::now();
    while start.elapsed() < START_TIMEOUT {
        if probe(&socket_path) {
            return Ok(ConnectorClient::new(socket_path));
        }
        if let Ok(Some(status)) = child.try_wait() {
            return Err(ClientError::StartFailed(format!(
                "connector exited with {status}"
            )));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Err(ClientError::StartFailed(
        "timed out waiting for the connector socket".to_string(),
    ))
}

/// Client for an already-running daemon; never starts one.
pub fn existing_client() -> ConnectorClient {
    ConnectorClient::from_env()
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
