// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        state_dir: dir.to_path_buf(),
        socket_path: dir.join("rootd.socket"),
        lock_path: dir.join("rootd.pid"),
        log_path: dir.join("rootd.log"),
    }
}

#[tokio::test]
async fn startup_binds_socket_and_writes_pid() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let result = startup(&config).await.unwrap();
    assert!(config.socket_path.exists());
    assert_eq!(
        tp_adapters::read_pid(&config.lock_path),
        Some(std::process::id())
    );
    shutdown(&config, result.lock);
    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn second_startup_fails_while_first_holds_the_lock() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let first = startup(&config).await.unwrap();
    let err = startup(&config).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Lock(_)));
    shutdown(&config, first.lock);
    let _ = first.listener;
}

#[tokio::test]
async fn startup_replaces_orphaned_socket() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    // A leftover socket file from an ungraceful exit.
    drop(tp_ipc::socket::bind(&config.socket_path).unwrap());
    assert!(config.socket_path.exists());

    let result = startup(&config).await.unwrap();
    assert!(config.socket_path.exists());
    shutdown(&config, result.lock);
}

#[test]
#[serial(rootd_env)]
fn config_load_honors_dir_override() {
    std::env::set_var("TELEPRESENCE_ROOTD_DIR", "/tmp/tp-test-rootd");
    let config = Config::load();
    assert_eq!(
        config.lock_path,
        std::path::PathBuf::from("/tmp/tp-test-rootd/telepresence-rootd.pid")
    );
    std::env::remove_var("TELEPRESENCE_ROOTD_DIR");
}
