// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dialing a daemon socket, with orphan recovery.
//!
//! A socket file with nobody listening is the trace of an ungraceful
//! exit: listeners never unlink on close, so a crash leaves the file
//! behind. The dialer removes such an orphan and retries exactly once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UnixStream;
use tracing::debug;

/// Dial failures, worded for humans.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("the {name} is not running")]
    NotRunning { name: &'static str },

    #[error("the {name} has terminated ungracefully")]
    TerminatedUngracefully { name: &'static str },

    #[error("the {name} has locked up")]
    LockedUp { name: &'static str },

    #[error("failed to dial {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Connect to the daemon named `name` at `path`.
///
/// Protocol: a missing socket file means the process is not running. A
/// refused connection on the first attempt while the file exists is an
/// orphan; the file is unlinked and the connect retried exactly once. A
/// second refusal reports an ungraceful termination; exceeding `timeout`
/// reports a lock-up.
pub async fn dial(path: &Path, name: &'static str, timeout: Duration) -> Result<UnixStream, DialError> {
    if !path.exists() {
        return Err(DialError::NotRunning { name });
    }

    match connect(path, name, timeout).await {
        Ok(stream) => Ok(stream),
        Err(e) if refused(&e) => {
            debug!(path = %path.display(), "removing orphaned socket and retrying");
            let _ = std::fs::remove_file(path);
            match connect(path, name, timeout).await {
                Ok(stream) => Ok(stream),
                // The orphan is gone and nothing re-bound: not running.
                Err(e) if missing(&e) => Err(DialError::NotRunning { name }),
                Err(e) if refused(&e) => Err(DialError::TerminatedUngracefully { name }),
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

async fn connect(path: &Path, name: &'static str, timeout: Duration) -> Result<UnixStream, DialError> {
    match tokio::time::timeout(timeout, UnixStream::connect(path)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(DialError::Io {
            path: path.to_path_buf(),
            source,
        }),
        Err(_) => Err(DialError::LockedUp { name }),
    }
}

fn refused(err: &DialError) -> bool {
    matches!(
        err,
        DialError::Io { source, .. } if source.kind() == std::io::ErrorKind::ConnectionRefused
    )
}

fn missing(err: &DialError) -> bool {
    matches!(
        err,
        DialError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
    )
}

/// Non-destructive liveness check: can the socket accept a connection?
pub fn probe(path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(path).is_ok()
}

#[cfg(test)]
#[path = "dial_tests.rs"]
mod tests;
