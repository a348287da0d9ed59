// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tp_ipc::{dial, socket, DnsSpec};

async fn start_listener(dir: &std::path::Path) -> (std::path::PathBuf, Arc<ListenCtx>) {
    let path = dir.join("rootd.socket");
    let listener = socket::bind(&path).unwrap();
    let ctx = Arc::new(ListenCtx {
        network: Arc::new(Mutex::new(NetworkState::new())),
        log_level: None,
        shutdown: Arc::new(Notify::new()),
    });
    tokio::spawn(Listener::new(listener, Arc::clone(&ctx)).run());
    (path, ctx)
}

async fn roundtrip(path: &std::path::Path, request: &RootRequest) -> RootResponse {
    let stream = dial(path, "root daemon", DEFAULT_IPC_TIMEOUT).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    wire::write_timed(&mut writer, request, DEFAULT_IPC_TIMEOUT)
        .await
        .unwrap();
    wire::read_timed(&mut reader, DEFAULT_IPC_TIMEOUT)
        .await
        .unwrap()
}

#[tokio::test]
async fn version_handshake() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, _ctx) = start_listener(tmp.path()).await;
    let response = roundtrip(&path, &RootRequest::Version).await;
    assert_eq!(
        response,
        RootResponse::Version {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn open_status_close_over_the_socket() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, _ctx) = start_listener(tmp.path()).await;

    let response = roundtrip(
        &path,
        &RootRequest::OpenNetwork {
            session_id: "s1".to_string(),
            dns: DnsSpec::default(),
            also_proxy: Vec::new(),
            never_proxy: Vec::new(),
            allow_conflicting: Vec::new(),
        },
    )
    .await;
    assert_eq!(response, RootResponse::Ok);

    match roundtrip(&path, &RootRequest::Status).await {
        RootResponse::Status { status } => {
            assert!(status.programmed);
            assert_eq!(status.session_id.as_deref(), Some("s1"));
        }
        other => panic!("unexpected response: {other:?}"),
    }

    assert_eq!(
        roundtrip(&path, &RootRequest::CloseNetwork).await,
        RootResponse::Ok
    );
    match roundtrip(&path, &RootRequest::Status).await {
        RootResponse::Status { status } => assert!(!status.programmed),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn conflicting_open_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, ctx) = start_listener(tmp.path()).await;
    ctx.network
        .lock()
        .open("s1".to_string(), DnsSpec::default(), Vec::new(), Vec::new(), Vec::new())
        .unwrap();

    let response = roundtrip(
        &path,
        &RootRequest::OpenNetwork {
            session_id: "s2".to_string(),
            dns: DnsSpec::default(),
            also_proxy: Vec::new(),
            never_proxy: Vec::new(),
            allow_conflicting: Vec::new(),
        },
    )
    .await;
    match response {
        RootResponse::Error { failure } => {
            assert!(failure.message.contains("already open for session s1"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn quit_notifies_shutdown() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, ctx) = start_listener(tmp.path()).await;
    let notified = ctx.shutdown.notified();

    let response = roundtrip(&path, &RootRequest::Quit).await;
    assert_eq!(response, RootResponse::ShuttingDown);
    tokio::time::timeout(std::time::Duration::from_secs(2), notified)
        .await
        .unwrap();
}

#[tokio::test]
async fn set_log_level_without_handle_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, _ctx) = start_listener(tmp.path()).await;
    let response = roundtrip(
        &path,
        &RootRequest::SetLogLevel {
            level: "debug".to_string(),
            duration: None,
        },
    )
    .await;
    assert!(matches!(response, RootResponse::Error { .. }));
}
