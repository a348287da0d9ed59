// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `telepresence quit` - disconnect and stop both daemons.
//!
//! Shutdown is the one moment the CLI talks to the root daemon
//! directly; everything else goes through the connector.

use anyhow::Result;

use tp_ipc::wire;
use tp_ipc::{dial, RootRequest, RootResponse, DEFAULT_IPC_TIMEOUT};

use crate::client::ClientError;
use crate::daemon_process;

pub async fn run() -> Result<()> {
    let client = daemon_process::existing_client();
    match client.quit().await {
        Ok(()) => println!("User daemon stopped"),
        Err(ClientError::Dial(_)) => println!("User daemon: not running"),
        Err(e) => return Err(e.into()),
    }

    match quit_root().await {
        Ok(()) => println!("Root daemon stopped"),
        Err(ClientError::Dial(_)) => println!("Root daemon: not running"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn quit_root() -> Result<(), ClientError> {
    let path = tp_ipc::socket::root_socket();
    let stream = dial(&path, "root daemon", DEFAULT_IPC_TIMEOUT).await?;
    let (mut reader, mut writer) = stream.into_split();
    wire::write_timed(&mut writer, &RootRequest::Quit, DEFAULT_IPC_TIMEOUT).await?;
    let response: RootResponse = wire::read_timed(&mut reader, DEFAULT_IPC_TIMEOUT).await?;
    match response {
        RootResponse::ShuttingDown | RootResponse::Ok => Ok(()),
        _ => Err(ClientError::UnexpectedResponse),
    }
}
