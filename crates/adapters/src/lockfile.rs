// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive PID lock for a daemon.
//!
//! The lock is held for the process lifetime; the file doubles as the
//! PID file other processes read.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to acquire lock: daemon already running?")]
    Held(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An acquired PID lock. Dropping releases the OS lock; the file itself
/// is removed by [`PidLock::release`] at graceful exit.
#[derive(Debug)]
pub struct PidLock {
    // NOTE(lifetime): held to maintain the exclusive file lock
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl PidLock {
    /// Acquire the lock and write this process's PID into it.
    ///
    /// The file is opened without truncation so a losing contender does
    /// not wipe the running daemon's PID.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.try_lock_exclusive().map_err(LockError::Held)?;

        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Remove the PID file at graceful exit.
    pub fn release(self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Read the PID recorded in a lock file, if any.
pub fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Check whether a process with the given PID exists.
pub fn process_exists(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "lockfile_tests.rs"]
mod tests;
