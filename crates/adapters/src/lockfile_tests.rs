// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn acquire_writes_pid() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("daemon.pid");
    let lock = PidLock::acquire(&path).unwrap();
    assert_eq!(read_pid(&path), Some(std::process::id()));
    lock.release();
    assert!(!path.exists());
}

#[test]
fn second_acquire_fails_while_held() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("daemon.pid");
    let _lock = PidLock::acquire(&path).unwrap();
    let err = PidLock::acquire(&path).unwrap_err();
    assert!(matches!(err, LockError::Held(_)));
    // The loser must not have wiped the holder's PID.
    assert_eq!(read_pid(&path), Some(std::process::id()));
}

#[test]
fn acquire_creates_parent_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested/daemon.pid");
    let lock = PidLock::acquire(&path).unwrap();
    lock.release();
}

#[test]
fn own_process_exists() {
    assert!(process_exists(std::process::id()));
}

#[test]
fn read_pid_of_missing_file_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    assert_eq!(read_pid(&tmp.path().join("nope.pid")), None);
}
