// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::start_rootd;

#[tokio::test]
async fn version_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, _ctx) = start_rootd(tmp.path()).await;
    let client = RootClient::new(socket);
    assert_eq!(client.version().await.unwrap(), tp_ipc::PROTOCOL_VERSION);
}

#[tokio::test]
async fn open_status_and_close() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, _ctx) = start_rootd(tmp.path()).await;
    let client = RootClient::new(socket);

    client
        .open_network(
            "s1",
            DnsSpec::default(),
            vec!["10.0.0.0/8".to_string()],
            Vec::new(),
            Vec::new(),
        )
        .await
        .unwrap();

    let status = client.status().await.unwrap();
    assert!(status.programmed);
    assert_eq!(status.also_proxy, vec!["10.0.0.0/8"]);

    client.add_subnets(vec!["10.96.0.0/12".to_string()]).await.unwrap();
    let status = client.status().await.unwrap();
    assert_eq!(status.subnets, vec!["10.96.0.0/12"]);

    client.close_network().await.unwrap();
    assert!(!client.status().await.unwrap().programmed);
}

#[tokio::test]
async fn rejection_surfaces_the_message() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, _ctx) = start_rootd(tmp.path()).await;
    let client = RootClient::new(socket);

    let err = client
        .add_subnets(vec!["10.0.0.0/8".to_string()])
        .await
        .unwrap_err();
    match err {
        RootClientError::Rejected(message) => assert!(message.contains("not open")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_daemon_is_not_running() {
    let tmp = tempfile::tempdir().unwrap();
    let client = RootClient::new(tmp.path().join("absent.socket"));
    let err = client.version().await.unwrap_err();
    assert_eq!(err.to_string(), "the root daemon is not running");
}

#[tokio::test]
async fn quit_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let (socket, ctx) = start_rootd(tmp.path()).await;
    let client = RootClient::new(socket);
    let notified = ctx.shutdown.notified();
    client.quit().await.unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(2), notified)
        .await
        .unwrap();
}
