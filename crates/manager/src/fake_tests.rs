// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tp_core::{PortSpec, WorkloadRef};

fn client() -> ClientInfo {
    ClientInfo {
        name: "dev@workstation".to_string(),
        install_id: "install-1".to_string(),
        version: "0.1.0".to_string(),
    }
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
        mount: tp_core::MountPolicy::Disabled,
        extra_ports: Vec::new(),
        local_only: false,
        preview_url: None,
    }
}

#[tokio::test]
async fn arrive_issues_distinct_sessions() {
    let api = FakeManager::new();
    let a = api.arrive(client()).await.unwrap();
    let b = api.arrive(client()).await.unwrap();
    assert_ne!(a.session, b.session);
}

#[tokio::test]
async fn stale_session_is_rejected() {
    let api = FakeManager::new();
    let old = api.arrive(client()).await.unwrap();
    let _new = api.arrive(client()).await.unwrap();
    let err = api.remain(&old.session).await.unwrap_err();
    assert_eq!(err, ManagerError::SessionInvalid);
}

#[tokio::test]
async fn create_duplicate_yields_already_exists() {
    let api = FakeManager::new();
    let arrival = api.arrive(client()).await.unwrap();
    api.create_intercept(&arrival.session, &spec("echo"))
        .await
        .unwrap();
    let err = api
        .create_intercept(&arrival.session, &spec("echo"))
        .await
        .unwrap_err();
    match err {
        ManagerError::Intercept(ie) => assert_eq!(ie.code, InterceptCode::AlreadyExists),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn remove_absent_yields_not_found() {
    let api = FakeManager::new();
    let arrival = api.arrive(client()).await.unwrap();
    let err = api
        .remove_intercept(&arrival.session, "ghost")
        .await
        .unwrap_err();
    match err {
        ManagerError::Intercept(ie) => assert_eq!(ie.code, InterceptCode::NotFound),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn watchers_see_creation_and_disposition_changes() {
    let api = FakeManager::new();
    let arrival = api.arrive(client()).await.unwrap();
    let mut rx = api.watch_intercepts(&arrival.session).await.unwrap();

    // Initial snapshot is empty.
    assert_eq!(rx.recv().await.unwrap(), Vec::new());

    api.create_intercept(&arrival.session, &spec("echo"))
        .await
        .unwrap();
    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].disposition, Disposition::Waiting);

    api.set_disposition("echo", Disposition::Active, "");
    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot[0].disposition, Disposition::Active);

    api.drop_intercept("echo");
    assert_eq!(rx.recv().await.unwrap(), Vec::new());
}

#[tokio::test]
async fn prepared_intercept_carries_pod_environment() {
    let api = FakeManager::new();
    api.set_pod_environment(HashMap::from([(
        "DATABASE_URL".to_string(),
        "postgres://db".to_string(),
    )]));
    let arrival = api.arrive(client()).await.unwrap();
    let prepared = api
        .prepare_intercept(&arrival.session, &spec("echo"))
        .await
        .unwrap();
    assert_eq!(prepared.environment["DATABASE_URL"], "postgres://db");
    assert_eq!(prepared.pod_name, "echo-easy-pod");
}

#[tokio::test]
async fn depart_clears_intercepts() {
    let api = FakeManager::new();
    let arrival = api.arrive(client()).await.unwrap();
    api.create_intercept(&arrival.session, &spec("echo"))
        .await
        .unwrap();
    api.depart(&arrival.session).await.unwrap();
    assert!(api.intercept_names().is_empty());
}
