// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::socket::bind;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn missing_socket_means_not_running() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("daemon.socket");
    let err = dial(&path, "user daemon", TIMEOUT).await.unwrap_err();
    assert_eq!(err.to_string(), "the user daemon is not running");
}

#[tokio::test]
async fn dials_a_live_listener() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("daemon.socket");
    let listener = bind(&path).unwrap();
    tokio::spawn(async move {
        let _ = listener.accept().await;
    });
    assert!(dial(&path, "user daemon", TIMEOUT).await.is_ok());
}

#[tokio::test]
async fn orphan_socket_is_unlinked_and_reported_not_running() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("daemon.socket");

    // Bind and drop: the file stays behind with nobody listening.
    drop(bind(&path).unwrap());
    assert!(path.exists());

    let err = dial(&path, "user daemon", TIMEOUT).await.unwrap_err();
    assert_eq!(err.to_string(), "the user daemon is not running");
    // Exactly one unlink happened; the orphan is gone.
    assert!(!path.exists());
}

#[tokio::test]
async fn listen_succeeds_after_orphan_recovery() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("daemon.socket");
    drop(bind(&path).unwrap());

    let _ = dial(&path, "user daemon", TIMEOUT).await;
    let listener = bind(&path).unwrap();
    tokio::spawn(async move {
        let _ = listener.accept().await;
    });
    assert!(dial(&path, "user daemon", TIMEOUT).await.is_ok());
}

#[tokio::test]
async fn probe_distinguishes_live_from_orphan() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("daemon.socket");
    assert!(!probe(&path));

    let listener = bind(&path).unwrap();
    tokio::spawn(async move {
        let _ = listener.accept().await;
    });
    assert!(probe(&path));
}
