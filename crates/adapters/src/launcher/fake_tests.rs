// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::launcher::fake::LauncherCall;
use std::time::Duration;

#[tokio::test]
async fn records_launches_and_exits_on_demand() {
    let mut launcher = FakeLauncher::new();
    let mut proc = launcher.launch().await.unwrap();
    assert_eq!(launcher.launch_count(), 1);

    launcher.exit_current(7);
    let code = tokio::time::timeout(Duration::from_secs(1), proc.exit_rx())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code, Some(7));
}

#[tokio::test]
async fn scripted_launch_failure() {
    let mut launcher = FakeLauncher::new();
    launcher.fail_next_launch();
    assert!(launcher.launch().await.is_err());
    // The failure is one-shot.
    assert!(launcher.launch().await.is_ok());
}

#[tokio::test]
async fn terminate_completes_exit_when_scripted() {
    let mut launcher = FakeLauncher::new().exit_on_terminate(0);
    let mut proc = launcher.launch().await.unwrap();
    proc.terminate();
    assert_eq!(
        launcher.calls(),
        vec![LauncherCall::Launch, LauncherCall::Terminate]
    );
    let code = tokio::time::timeout(Duration::from_secs(1), proc.exit_rx())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code, Some(0));
}

#[tokio::test]
async fn kill_exits_without_a_code() {
    let mut launcher = FakeLauncher::new();
    let mut proc = launcher.launch().await.unwrap();
    proc.kill();
    let code = tokio::time::timeout(Duration::from_secs(1), proc.exit_rx())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code, None);
}
