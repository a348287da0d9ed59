// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn small_log_is_not_rotated() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("daemon.log");
    std::fs::write(&log, "short").unwrap();
    rotate_log_if_needed(&log);
    assert!(log.exists());
    assert!(!tmp.path().join("daemon.log.1").exists());
}

#[test]
fn oversized_log_rotates_and_shifts() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("daemon.log");
    let big = vec![b'x'; (MAX_LOG_SIZE + 1) as usize];
    std::fs::write(&log, &big).unwrap();
    std::fs::write(tmp.path().join("daemon.log.1"), "old-1").unwrap();

    rotate_log_if_needed(&log);

    assert!(!log.exists());
    assert_eq!(
        std::fs::metadata(tmp.path().join("daemon.log.1")).unwrap().len(),
        MAX_LOG_SIZE + 1
    );
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("daemon.log.2")).unwrap(),
        "old-1"
    );
}

#[test]
fn startup_marker_appends_pid_line() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("daemon.log");
    write_startup_marker(&log, "telepresence-rootd").unwrap();
    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.starts_with("--- telepresence-rootd: starting (pid: "));
}

#[test]
fn startup_error_is_written_synchronously() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("daemon.log");
    write_startup_error(&log, &"socket bind failed");
    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("ERROR Failed to start daemon: socket bind failed"));
}

#[test]
fn bad_level_is_rejected() {
    assert!(parse_level("loud").is_err());
    assert!(parse_level("debug").is_ok());
}
