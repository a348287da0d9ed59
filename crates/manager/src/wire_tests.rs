// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::net::TcpListener;
use tp_core::{InterceptCode, InterceptError};

/// One-connection-at-a-time scripted manager endpoint.
async fn serve(responses: Vec<Vec<ManagerResponse>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        for burst in responses {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (mut reader, mut writer) = stream.into_split();
            let _request = wire::read_message(&mut reader).await.unwrap();
            for response in burst {
                let data = wire::encode(&response).unwrap();
                wire::write_message(&mut writer, &data).await.unwrap();
            }
            // Dropping the halves closes the stream.
        }
    });
    addr
}

fn version_info() -> VersionInfo {
    VersionInfo {
        name: "traffic-manager".to_string(),
        version: "2.7.0".to_string(),
    }
}

#[tokio::test]
async fn version_call_round_trips() {
    let addr = serve(vec![vec![ManagerResponse::Version {
        info: version_info(),
    }]])
    .await;
    let manager = WireManager::new(addr);
    let info = manager.version().await.unwrap();
    assert_eq!(info, version_info());
}

#[tokio::test]
async fn error_response_surfaces_typed_error() {
    let addr = serve(vec![vec![ManagerResponse::Error {
        error: ManagerError::Intercept(InterceptError::new(
            InterceptCode::NotFound,
            "intercept echo not found",
        )),
    }]])
    .await;
    let manager = WireManager::new(addr);
    let err = manager
        .remove_intercept(&SessionId("s1".to_string()), "echo")
        .await
        .unwrap_err();
    match err {
        ManagerError::Intercept(ie) => assert_eq!(ie.code, InterceptCode::NotFound),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_manager_is_unavailable() {
    // Port 1 on localhost refuses.
    let manager = WireManager::new("127.0.0.1:1");
    let err = manager.version().await.unwrap_err();
    assert!(matches!(err, ManagerError::Unavailable(_)));
}

#[tokio::test]
async fn unexpected_response_is_a_protocol_error() {
    let addr = serve(vec![vec![ManagerResponse::Ok]]).await;
    let manager = WireManager::new(addr);
    let err = manager.version().await.unwrap_err();
    assert!(matches!(err, ManagerError::Protocol(_)));
}

#[tokio::test]
async fn watch_streams_snapshots_until_close() {
    let addr = serve(vec![vec![
        ManagerResponse::InterceptSnapshot {
            intercepts: Vec::new(),
        },
        ManagerResponse::InterceptSnapshot {
            intercepts: Vec::new(),
        },
    ]])
    .await;
    let manager = WireManager::new(addr);
    let mut rx = manager
        .watch_intercepts(&SessionId("s1".to_string()))
        .await
        .unwrap();
    assert!(rx.recv().await.is_some());
    assert!(rx.recv().await.is_some());
    // Server closed the connection: stream ends.
    assert!(rx.recv().await.is_none());
}

#[test]
fn service_addr_shape() {
    assert_eq!(
        WireManager::service_addr("ambassador", 8081),
        "svc/traffic-manager.ambassador:8081"
    );
}
