// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Msg {
    name: String,
    port: u16,
}

fn msg() -> Msg {
    Msg {
        name: "echo".to_string(),
        port: 8080,
    }
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let (client, server) = tokio::io::duplex(1024);
    let (_, mut writer) = tokio::io::split(client);
    let (mut reader, _) = tokio::io::split(server);

    let data = encode(&msg()).unwrap();
    write_message(&mut writer, &data).await.unwrap();

    let bytes = read_message(&mut reader).await.unwrap();
    let back: Msg = decode(&bytes).unwrap();
    assert_eq!(back, msg());
}

#[tokio::test]
async fn read_reports_closed_connection() {
    let (client, server) = tokio::io::duplex(1024);
    drop(client);
    let (mut reader, _) = tokio::io::split(server);
    let err = read_message(&mut reader).await.unwrap_err();
    assert!(matches!(err, WireError::ConnectionClosed));
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    let (client, server) = tokio::io::duplex(1024);
    let (_, mut writer) = tokio::io::split(client);
    let (mut reader, _) = tokio::io::split(server);

    // Announce 1 GiB without sending it.
    tokio::io::AsyncWriteExt::write_all(&mut writer, &(1u32 << 30).to_be_bytes())
        .await
        .unwrap();

    let err = read_message_capped(&mut reader, 1024).await.unwrap_err();
    assert!(matches!(err, WireError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn read_timed_times_out_on_silence() {
    let (_client, server) = tokio::io::duplex(1024);
    let (mut reader, _) = tokio::io::split(server);
    let err = read_timed::<_, Msg>(&mut reader, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::Timeout));
}

#[tokio::test]
async fn write_timed_then_read_timed() {
    let (client, server) = tokio::io::duplex(1024);
    let (_, mut writer) = tokio::io::split(client);
    let (mut reader, _) = tokio::io::split(server);

    write_timed(&mut writer, &msg(), Duration::from_secs(1))
        .await
        .unwrap();
    let back: Msg = read_timed(&mut reader, Duration::from_secs(1)).await.unwrap();
    assert_eq!(back, msg());
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode::<Msg>(b"not json").is_err());
}
