// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeMountBridge;
use super::*;

#[tokio::test]
async fn no_bridge_is_unavailable_and_refuses() {
    let bridge = NoBridge;
    assert!(!bridge.available());
    let err = bridge
        .mount("intercept-1", Path::new("/tmp/mnt"))
        .await
        .unwrap_err();
    assert_eq!(err, MountError::BridgeUnavailable);
    // Unmount of nothing is harmless.
    assert!(bridge.unmount("intercept-1", Path::new("/tmp/mnt")).await.is_ok());
}

#[tokio::test]
async fn fake_tracks_mount_lifecycle() {
    let bridge = FakeMountBridge::new();
    assert!(bridge.available());

    bridge.mount("i1", Path::new("/tmp/a")).await.unwrap();
    assert_eq!(bridge.active_count(), 1);

    bridge.unmount("i1", Path::new("/tmp/a")).await.unwrap();
    assert_eq!(bridge.active_count(), 0);
    assert_eq!(bridge.mounts().len(), 1);
    assert_eq!(bridge.unmounts().len(), 1);
}

#[tokio::test]
async fn fake_rejects_busy_mount_point() {
    let bridge = FakeMountBridge::new();
    bridge.mount("i1", Path::new("/tmp/a")).await.unwrap();
    let err = bridge.mount("i2", Path::new("/tmp/a")).await.unwrap_err();
    assert!(matches!(err, MountError::MountPointBusy(_)));
}

#[tokio::test]
async fn fake_can_simulate_missing_bridge() {
    let bridge = FakeMountBridge::unavailable();
    assert!(!bridge.available());
    let err = bridge.mount("i1", Path::new("/tmp/a")).await.unwrap_err();
    assert_eq!(err, MountError::BridgeUnavailable);
}
