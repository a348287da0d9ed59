// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the daemon's tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use tp_adapters::FakeMountBridge;
use tp_core::ConnectRequest;
use tp_manager::FakeManager;

use crate::dialer::fake::FakeDialer;
use crate::dialer::NoInstaller;
use crate::rootd::RootClient;
use crate::session::OrchestratorDeps;

/// A root daemon listener on a socket under `dir`.
pub(crate) async fn start_rootd(dir: &Path) -> (PathBuf, Arc<tp_rootd::ListenCtx>) {
    let path = dir.join("rootd.socket");
    let listener = tp_ipc::socket::bind(&path).unwrap();
    let ctx = Arc::new(tp_rootd::ListenCtx {
        network: Arc::new(Mutex::new(tp_rootd::NetworkState::new())),
        log_level: None,
        shutdown: Arc::new(Notify::new()),
    });
    tokio::spawn(tp_rootd::Listener::new(listener, Arc::clone(&ctx)).run());
    (path, ctx)
}

pub(crate) fn deps(
    dialer: FakeDialer,
    root_socket: PathBuf,
) -> OrchestratorDeps<FakeDialer, FakeMountBridge, NoInstaller> {
    OrchestratorDeps {
        dialer,
        installer: NoInstaller,
        bridge: FakeMountBridge::new(),
        root: RootClient::new(root_socket),
        client_version: "0.1.0".to_string(),
        install_id: "test-install".to_string(),
    }
}

pub(crate) fn manager() -> FakeManager {
    FakeManager::new()
}

pub(crate) fn request(context: &str) -> ConnectRequest {
    ConnectRequest {
        context: context.to_string(),
        manager_namespace: "ambassador".to_string(),
        mapped_namespaces: Vec::new(),
    }
}
