// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tp_core::{InterceptCode, MountPolicy, PortSpec, WorkloadRef};
use tp_daemon::dialer::fake::FakeDialer;
use tp_daemon::session::{Orchestrator, OrchestratorDeps};
use tp_daemon::{ListenCtx, Listener, RootClient};
use tp_manager::FakeManager;

/// In-process connector over real sockets, backed by fakes.
async fn start_stack(dir: &std::path::Path) -> (PathBuf, FakeManager) {
    let root_path = dir.join("rootd.socket");
    let root_listener = tp_ipc::socket::bind(&root_path).unwrap();
    let root_ctx = Arc::new(tp_rootd::ListenCtx {
        network: Arc::new(Mutex::new(tp_rootd::NetworkState::new())),
        log_level: None,
        shutdown: Arc::new(Notify::new()),
    });
    tokio::spawn(tp_rootd::Listener::new(root_listener, root_ctx).run());

    let manager = FakeManager::new();
    let orchestrator = Orchestrator::spawn(OrchestratorDeps {
        dialer: FakeDialer::new(manager.clone()),
        installer: tp_daemon::NoInstaller,
        bridge: tp_adapters::FakeMountBridge::new(),
        root: RootClient::new(root_path.clone()),
        client_version: "0.1.0".to_string(),
        install_id: "test".to_string(),
    });

    let connector_path = dir.join("connector.socket");
    let listener = tp_ipc::socket::bind(&connector_path).unwrap();
    let ctx = Arc::new(ListenCtx {
        orchestrator,
        root: RootClient::new(root_path),
        log_level: None,
        shutdown: Arc::new(Notify::new()),
        version: "0.1.0".to_string(),
    });
    tokio::spawn(Listener::new(listener, ctx).run());

    (connector_path, manager)
}

fn spec(name: &str) -> InterceptSpec {
    InterceptSpec {
        name: name.to_string(),
        workload: WorkloadRef {
            kind: "Deployment".to_string(),
            name: "echo-easy".to_string(),
            namespace: "default".to_string(),
        },
        port: PortSpec::parse("8080", false).unwrap(),
        target_host: "127.0.0.1".to_string(),
        mechanism: "tcp".to_string(),
        mechanism_args: Vec::new(),
        mount: MountPolicy::Disabled,
        extra_ports: Vec::new(),
        local_only: false,
        preview_url: None,
    }
}

fn connect_request() -> ConnectRequest {
    ConnectRequest {
        context: "prod".to_string(),
        manager_namespace: "ambassador".to_string(),
        mapped_namespaces: Vec::new(),
    }
}

#[tokio::test]
async fn connect_and_status_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, _manager) = start_stack(tmp.path()).await;
    let client = ConnectorClient::new(socket);

    let outcome = client.connect(connect_request()).await.unwrap();
    assert_eq!(outcome.code, ConnectCode::Unspecified);
    assert!(outcome.session.is_some());

    let status = client.status().await.unwrap();
    assert!(status.session.is_some());
    assert_eq!(status.version, "0.1.0");
}

#[tokio::test]
async fn second_connect_reports_already_connected() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, _manager) = start_stack(tmp.path()).await;
    let client = ConnectorClient::new(socket);

    client.connect(connect_request()).await.unwrap();
    let again = client.connect(connect_request()).await.unwrap();
    assert_eq!(again.code, ConnectCode::AlreadyConnected);
}

#[tokio::test]
async fn intercept_errors_carry_structured_codes() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, _manager) = start_stack(tmp.path()).await;
    let client = ConnectorClient::new(socket);
    client.connect(connect_request()).await.unwrap();

    client.create_intercept(spec("echo")).await.unwrap();
    let err = client.create_intercept(spec("echo")).await.unwrap_err();
    assert_eq!(err.intercept_code(), Some(InterceptCode::AlreadyExists));
    assert_eq!(err.category(), Category::User);
}

#[tokio::test]
async fn remove_after_success_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, _manager) = start_stack(tmp.path()).await;
    let client = ConnectorClient::new(socket);
    client.connect(connect_request()).await.unwrap();

    client.create_intercept(spec("echo")).await.unwrap();
    client.remove_intercept("echo").await.unwrap();
    let err = client.remove_intercept("echo").await.unwrap_err();
    assert_eq!(err.intercept_code(), Some(InterceptCode::NotFound));
}

#[tokio::test]
async fn missing_daemon_yields_not_running() {
    let tmp = tempfile::tempdir().unwrap();
    let client = ConnectorClient::new(tmp.path().join("absent.socket"));
    let err = client.version().await.unwrap_err();
    assert_eq!(err.to_string(), "the user daemon is not running");
    assert_eq!(err.category(), Category::NoDaemonLogs);
}
