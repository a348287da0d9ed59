// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed client for the root daemon.
//!
//! The user daemon is the only caller; every request opens a short-lived
//! connection to the root socket.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use tp_ipc::wire::WireError;
use tp_ipc::{dial, wire, DialError, DnsSpec, RootRequest, RootResponse, RootStatus};
use tp_ipc::DEFAULT_IPC_TIMEOUT;

#[derive(Debug, Error)]
pub enum RootClientError {
    #[error(transparent)]
    Dial(#[from] DialError),

    #[error("root daemon protocol error: {0}")]
    Wire(#[from] WireError),

    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response from root daemon")]
    UnexpectedResponse,
}

/// Client over the root-daemon socket.
#[derive(Debug, Clone)]
pub struct RootClient {
    socket_path: PathBuf,
}

impl RootClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// Client for the well-known root socket.
    pub fn from_env() -> Self {
        Self::new(tp_ipc::socket::root_socket())
    }

    async fn send(&self, request: &RootRequest) -> Result<RootResponse, RootClientError> {
        let stream = dial(&self.socket_path, "root daemon", DEFAULT_IPC_TIMEOUT).await?;
        let (mut reader, mut writer) = stream.into_split();
        wire::write_timed(&mut writer, request, DEFAULT_IPC_TIMEOUT).await?;
        let response = wire::read_timed(&mut reader, DEFAULT_IPC_TIMEOUT).await?;
        match response {
            RootResponse::Error { failure } => Err(RootClientError::Rejected(failure.message)),
            other => Ok(other),
        }
    }

    async fn send_simple(&self, request: &RootRequest) -> Result<(), RootClientError> {
        match self.send(request).await? {
            RootResponse::Ok => Ok(()),
            _ => Err(RootClientError::UnexpectedResponse),
        }
    }

    pub async fn version(&self) -> Result<String, RootClientError> {
        match self.send(&RootRequest::Version).await? {
            RootResponse::Version { version } => Ok(version),
            _ => Err(RootClientError::UnexpectedResponse),
        }
    }

    pub async fn open_network(
        &self,
        session_id: &str,
        dns: DnsSpec,
        also_proxy: Vec<String>,
        never_proxy: Vec<String>,
        allow_conflicting: Vec<String>,
    ) -> Result<(), RootClientError> {
        self.send_simple(&RootRequest::OpenNetwork {
            session_id: session_id.to_string(),
            dns,
            also_proxy,
            never_proxy,
            allow_conflicting,
        })
        .await
    }

    pub async fn close_network(&self) -> Result<(), RootClientError> {
        self.send_simple(&RootRequest::CloseNetwork).await
    }

    pub async fn set_dns_suffixes(&self, suffixes: Vec<String>) -> Result<(), RootClientError> {
        self.send_simple(&RootRequest::SetDnsSuffixes { suffixes })
            .await
    }

    pub async fn add_subnets(&self, subnets: Vec<String>) -> Result<(), RootClientError> {
        self.send_simple(&RootRequest::AddSubnets { subnets }).await
    }

    pub async fn status(&self) -> Result<RootStatus, RootClientError> {
        match self.send(&RootRequest::Status).await? {
            RootResponse::Status { status } => Ok(*status),
            _ => Err(RootClientError::UnexpectedResponse),
        }
    }

    pub async fn set_log_level(
        &self,
        level: &str,
        duration: Option<Duration>,
    ) -> Result<(), RootClientError> {
        self.send_simple(&RootRequest::SetLogLevel {
            level: level.to_string(),
            duration,
        })
        .await
    }

    pub async fn quit(&self) -> Result<(), RootClientError> {
        match self.send(&RootRequest::Quit).await? {
            RootResponse::ShuttingDown | RootResponse::Ok => Ok(()),
            _ => Err(RootClientError::UnexpectedResponse),
        }
    }
}

#[cfg(test)]
#[path = "rootd_tests.rs"]
mod tests;
