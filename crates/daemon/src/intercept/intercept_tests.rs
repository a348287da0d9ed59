// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tp_adapters::FakeMountBridge;
use tp_core::{PortSpec, WorkloadRef};
use tp_manager::{ClientInfo, FakeManager, ManagerCall};

fn spec(name: &str, port: &str) -> InterceptSpec {
    InterceptSpec {
        name: name.to_string(),
        workload: WorkloadRef {
            kind: "Deployment".to_string(),
            name: "echo-easy".to_string(),
            namespace: "default".to_string(),
        },
        port: PortSpec::parse(port, false).unwrap(),
        target_host: "127.0.0.1".to_string(),
        mechanism: "tcp".to_string(),
        mechanism_args: Vec::new(),
        mount: MountPolicy::Disabled,
        extra_ports: Vec::new(),
        local_only: false,
        preview_url: None,
    }
}

async fn arrive(api: &FakeManager) -> SessionId {
    api.arrive(ClientInfo {
        name: "dev@workstation".to_string(),
        install_id: "install".to_string(),
        version: "0.1.0".to_string(),
    })
    .await
    .unwrap()
    .session
}

async fn mgr() -> (InterceptManager<FakeManager, FakeMountBridge>, FakeManager) {
    let api = FakeManager::new();
    let session = arrive(&api).await;
    (
        InterceptManager::new(api.clone(), session, FakeMountBridge::new()),
        api,
    )
}

#[tokio::test]
async fn create_validates_before_any_side_effect() {
    let (mgr, api) = mgr().await;
    let info = mgr.create(spec("echo", "8080")).await.unwrap();
    assert_eq!(info.spec.name, "echo");
    assert!(info.environment.contains_key("POD_NAME"));

    let calls = api.calls();
    let can = calls
        .iter()
        .position(|c| *c == ManagerCall::CanIntercept("echo".to_string()))
        .unwrap();
    let create = calls
        .iter()
        .position(|c| *c == ManagerCall::CreateIntercept("echo".to_string()))
        .unwrap();
    assert!(can < create, "can_intercept must precede create");
}

#[tokio::test]
async fn duplicate_name_is_rejected_locally() {
    let (mgr, api) = mgr().await;
    mgr.create(spec("echo", "8080")).await.unwrap();
    let before = api.calls().len();
    let err = mgr.create(spec("echo", "8081")).await.unwrap_err();
    assert_eq!(err.code, Some(InterceptCode::AlreadyExists));
    // No extra round-trips for a locally detectable failure.
    assert_eq!(api.calls().len(), before);
}

#[tokio::test]
async fn port_conflict_names_the_holder() {
    let (mgr, _api) = mgr().await;
    mgr.create(spec("echo", "8080")).await.unwrap();
    let err = mgr.create(spec("other", "8080")).await.unwrap_err();
    assert_eq!(err.code, Some(InterceptCode::LocalTargetInUse));
    assert_eq!(
        err.message,
        "Port 127.0.0.1:8080 is already in use by intercept echo"
    );
}

#[tokio::test]
async fn local_only_skips_the_server() {
    let (mgr, api) = mgr().await;
    let mut s = spec("local", "8080");
    s.local_only = true;
    let info = mgr.create(s).await.unwrap();
    assert_eq!(info.disposition, Disposition::Active);
    assert!(api.calls().iter().all(|c| !matches!(
        c,
        ManagerCall::CanIntercept(_)
            | ManagerCall::PrepareIntercept(_)
            | ManagerCall::CreateIntercept(_)
    )));
    // Removal is local too.
    mgr.remove("local").await.unwrap();
    assert!(mgr.list().is_empty());
}

#[tokio::test]
async fn auto_mount_uses_a_temp_directory() {
    let api = FakeManager::new();
    let session = arrive(&api).await;
    let bridge = FakeMountBridge::new();
    let mgr = InterceptManager::new(api, session, bridge.clone());

    let mut s = spec("echo", "8080");
    s.mount = MountPolicy::Auto;
    let info = mgr.create(s).await.unwrap();
    let mount_point = info.mount_point.expect("mount point");
    assert!(mount_point.starts_with(std::env::temp_dir()));
    assert_eq!(bridge.active_count(), 1);

    mgr.remove("echo").await.unwrap();
    assert_eq!(bridge.active_count(), 0);
}

#[tokio::test]
async fn missing_bridge_fails_unless_mount_disabled() {
    let api = FakeManager::new();
    let session = arrive(&api).await;
    let mgr = InterceptManager::new(api, session, FakeMountBridge::unavailable());

    let mut s = spec("echo", "8080");
    s.mount = MountPolicy::Auto;
    let err = mgr.create(s).await.unwrap_err();
    assert_eq!(err.code, Some(InterceptCode::FailedToEstablish));
    assert!(err.message.contains("--mount=false"));

    // Explicitly disabled mounting works without a bridge.
    let info = mgr.create(spec("echo", "8080")).await.unwrap();
    assert_eq!(info.mount_point, None);
}

#[tokio::test]
async fn busy_mount_point_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let api = FakeManager::new();
    let session = arrive(&api).await;
    let bridge = FakeMountBridge::new();
    let mgr = InterceptManager::new(api.clone(), session, bridge);

    let mut a = spec("echo", "8080");
    a.mount = MountPolicy::Path(tmp.path().join("mnt"));
    mgr.create(a).await.unwrap();

    let mut b = spec("other", "8081");
    b.mount = MountPolicy::Path(tmp.path().join("mnt"));
    let err = mgr.create(b).await.unwrap_err();
    assert_eq!(err.code, Some(InterceptCode::MountPointBusy));
    // The half-created server-side intercept was cleaned up.
    assert_eq!(api.intercept_names(), vec!["echo"]);
}

#[tokio::test]
async fn remove_unknown_is_not_found() {
    let (mgr, _api) = mgr().await;
    let err = mgr.remove("ghost").await.unwrap_err();
    assert_eq!(err.code, Some(InterceptCode::NotFound));
}

#[tokio::test]
async fn container_stop_race_is_swallowed() {
    let (mgr, api) = mgr().await;
    mgr.create(spec("echo", "8080")).await.unwrap();
    mgr.set_container("echo", "intercept-echo-8080".to_string());

    // The container stopped first and the server already left.
    api.drop_intercept("echo");
    mgr.remove("echo").await.unwrap();
}

#[tokio::test]
async fn remove_race_without_container_still_errors() {
    let (mgr, api) = mgr().await;
    mgr.create(spec("echo", "8080")).await.unwrap();
    api.drop_intercept("echo");
    let err = mgr.remove("echo").await.unwrap_err();
    assert_eq!(err.code, Some(InterceptCode::NotFound));
}

#[tokio::test]
async fn snapshot_updates_dispositions_and_prunes() {
    let (mgr, api) = mgr().await;
    let info = mgr.create(spec("echo", "8080")).await.unwrap();
    assert_eq!(info.disposition, Disposition::Waiting);

    api.set_disposition("echo", Disposition::Active, "");
    let mut active_info = info.clone();
    active_info.disposition = Disposition::Active;
    let dropped = mgr.apply_snapshot(vec![active_info]);
    assert!(dropped.is_empty());
    assert_eq!(mgr.get("echo").unwrap().disposition, Disposition::Active);

    // The server dropped it (workload scaled to zero).
    let dropped = mgr.apply_snapshot(Vec::new());
    assert_eq!(dropped, vec!["echo"]);
    assert!(mgr.get("echo").is_none());
}

#[tokio::test]
async fn error_disposition_carries_the_message() {
    let (mgr, _api) = mgr().await;
    let info = mgr.create(spec("echo", "8080")).await.unwrap();
    let mut bad = info;
    bad.disposition = Disposition::NoAgent;
    bad.message = "no traffic agent in pod".to_string();
    mgr.apply_snapshot(vec![bad]);
    let current = mgr.get("echo").unwrap();
    assert_eq!(current.disposition, Disposition::NoAgent);
    assert_eq!(current.message, "no traffic agent in pod");
}

#[tokio::test]
async fn close_removes_everything() {
    let (mgr, api) = mgr().await;
    mgr.create(spec("echo", "8080")).await.unwrap();
    mgr.create(spec("other", "8081")).await.unwrap();
    mgr.close().await;
    assert!(mgr.list().is_empty());
    assert!(api.intercept_names().is_empty());
}

#[tokio::test]
async fn local_only_survives_empty_snapshots() {
    let (mgr, _api) = mgr().await;
    let mut s = spec("local", "8080");
    s.local_only = true;
    mgr.create(s).await.unwrap();
    let dropped = mgr.apply_snapshot(Vec::new());
    assert!(dropped.is_empty());
    assert!(mgr.get("local").is_some());
}
