// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire client for the traffic manager.
//!
//! Speaks the same length-prefixed JSON framing as the local IPC layer,
//! over a TCP address reached through the root daemon's virtual network
//! (`svc/traffic-manager.{namespace}:api`). Unary calls open a fresh
//! connection; watch calls keep theirs and stream messages until the
//! server closes it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::debug;

use tp_core::{InterceptInfo, InterceptSpec, PreviewSpec, SessionId};
use tp_ipc::wire;

use crate::api::{
    Arrival, ClientInfo, ClusterInfo, ManagerApi, ManagerError, PreparedIntercept, VersionInfo,
    WorkloadInfo,
};

/// Per-message read/write bound on the manager connection.
const RPC_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffered items per watch stream.
const WATCH_BUFFER: usize = 16;

/// Request to the traffic manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ManagerRequest {
    Version,
    Arrive {
        client: ClientInfo,
    },
    Remain {
        session_id: String,
    },
    Depart {
        session_id: String,
    },
    CanIntercept {
        session_id: String,
        spec: InterceptSpec,
    },
    PrepareIntercept {
        session_id: String,
        spec: InterceptSpec,
    },
    CreateIntercept {
        session_id: String,
        spec: InterceptSpec,
    },
    UpdateIntercept {
        session_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preview: Option<PreviewSpec>,
    },
    RemoveIntercept {
        session_id: String,
        name: String,
    },
    WatchIntercepts {
        session_id: String,
    },
    WatchWorkloads {
        session_id: String,
    },
    WatchClusterInfo {
        session_id: String,
    },
}

/// Response (or stream item) from the traffic manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ManagerResponse {
    Version { info: VersionInfo },
    Arrival { arrival: Arrival },
    Ok,
    Prepared { prepared: PreparedIntercept },
    Intercept { info: Box<InterceptInfo> },
    InterceptSnapshot { intercepts: Vec<InterceptInfo> },
    WorkloadSnapshot { workloads: Vec<WorkloadInfo> },
    ClusterInfo { info: ClusterInfo },
    Error { error: ManagerError },
}

/// Framed-JSON manager client.
#[derive(Debug, Clone)]
pub struct WireManager {
    /// `host:port` of the manager API through the virtual network.
    addr: String,
}

impl WireManager {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// The conventional manager address inside a namespace.
    pub fn service_addr(namespace: &str, api_port: u16) -> String {
        format!("svc/traffic-manager.{namespace}:{api_port}")
    }

    async fn connect(&self) -> Result<TcpStream, ManagerError> {
        TcpStream::connect(&self.addr)
            .await
            .map_err(|e| ManagerError::Unavailable(e.to_string()))
    }

    async fn call(&self, request: &ManagerRequest) -> Result<ManagerResponse, ManagerError> {
        let stream = self.connect().await?;
        let (mut reader, mut writer) = stream.into_split();
        wire::write_timed(&mut writer, request, RPC_IO_TIMEOUT)
            .await
            .map_err(|e| ManagerError::Unavailable(e.to_string()))?;
        let response: ManagerResponse = wire::read_timed(&mut reader, RPC_IO_TIMEOUT)
            .await
            .map_err(|e| ManagerError::Unavailable(e.to_string()))?;
        match response {
            ManagerResponse::Error { error } => Err(error),
            other => Ok(other),
        }
    }

    /// Open a watch connection and pump stream items into a channel.
    async fn open_watch<T, F>(
        &self,
        request: ManagerRequest,
        extract: F,
    ) -> Result<mpsc::Receiver<T>, ManagerError>
    where
        T: Send + 'static,
        F: Fn(ManagerResponse) -> Option<T> + Send + 'static,
    {
        let stream = self.connect().await?;
        let (mut reader, mut writer) = stream.into_split();
        wire::write_timed(&mut writer, &request, RPC_IO_TIMEOUT)
            .await
            .map_err(|e| ManagerError::Unavailable(e.to_string()))?;

        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        tokio::spawn(async move {
            // Hold the write half open for the lifetime of the watch.
            let _writer = writer;
            loop {
                let bytes = match wire::read_message(&mut reader).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        debug!(error = %e, "watch stream closed");
                        break;
                    }
                };
                let response: ManagerResponse = match wire::decode(&bytes) {
                    Ok(r) => r,
                    Err(e) => {
                        debug!(error = %e, "undecodable watch message");
                        break;
                    }
                };
                let Some(item) = extract(response) else {
                    continue;
                };
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

fn expect_protocol<T>(got: ManagerResponse) -> Result<T, ManagerError> {
    Err(ManagerError::Protocol(format!(
        "unexpected response: {got:?}"
    )))
}

#[async_trait]
impl ManagerApi for WireManager {
    async fn version(&self) -> Result<VersionInfo, ManagerError> {
        match self.call(&ManagerRequest::Version).await? {
            ManagerResponse::Version { info } => Ok(info),
            other => expect_protocol(other),
        }
    }

    async fn arrive(&self, client: ClientInfo) -> Result<Arrival, ManagerError> {
        match self.call(&ManagerRequest::Arrive { client }).await? {
            ManagerResponse::Arrival { arrival } => Ok(arrival),
            other => expect_protocol(other),
        }
    }

    async fn remain(&self, session: &SessionId) -> Result<(), ManagerError> {
        match self
            .call(&ManagerRequest::Remain {
                session_id: session.0.clone(),
            })
            .await?
        {
            ManagerResponse::Ok => Ok(()),
            other => expect_protocol(other),
        }
    }

    async fn depart(&self, session: &SessionId) -> Result<(), ManagerError> {
        match self
            .call(&ManagerRequest::Depart {
                session_id: session.0.clone(),
            })
            .await?
        {
            ManagerResponse::Ok => Ok(()),
            other => expect_protocol(other),
        }
    }

    async fn can_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<(), ManagerError> {
        match self
            .call(&ManagerRequest::CanIntercept {
                session_id: session.0.clone(),
                spec: spec.clone(),
            })
            .await?
        {
            ManagerResponse::Ok => Ok(()),
            other => expect_protocol(other),
        }
    }

    async fn prepare_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<PreparedIntercept, ManagerError> {
        match self
            .call(&ManagerRequest::PrepareIntercept {
                session_id: session.0.clone(),
                spec: spec.clone(),
            })
            .await?
        {
            ManagerResponse::Prepared { prepared } => Ok(prepared),
            other => expect_protocol(other),
        }
    }

    async fn create_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<InterceptInfo, ManagerError> {
        match self
            .call(&ManagerRequest::CreateIntercept {
                session_id: session.0.clone(),
                spec: spec.clone(),
            })
            .await?
        {
            ManagerResponse::Intercept { info } => Ok(*info),
            other => expect_protocol(other),
        }
    }

    async fn update_intercept(
        &self,
        session: &SessionId,
        name: &str,
        preview: Option<PreviewSpec>,
    ) -> Result<InterceptInfo, ManagerError> {
        match self
            .call(&ManagerRequest::UpdateIntercept {
                session_id: session.0.clone(),
                name: name.to_string(),
                preview,
            })
            .await?
        {
            ManagerResponse::Intercept { info } => Ok(*info),
            other => expect_protocol(other),
        }
    }

    async fn remove_intercept(&self, session: &SessionId, name: &str) -> Result<(), ManagerError> {
        match self
            .call(&ManagerRequest::RemoveIntercept {
                session_id: session.0.clone(),
                name: name.to_string(),
            })
            .await?
        {
            ManagerResponse::Ok => Ok(()),
            other => expect_protocol(other),
        }
    }

    async fn watch_intercepts(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<Vec<InterceptInfo>>, ManagerError> {
        self.open_watch(
            ManagerRequest::WatchIntercepts {
                session_id: session.0.clone(),
            },
            |response| match response {
                ManagerResponse::InterceptSnapshot { intercepts } => Some(intercepts),
                _ => None,
            },
        )
        .await
    }

    async fn watch_workloads(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<Vec<WorkloadInfo>>, ManagerError> {
        self.open_watch(
            ManagerRequest::WatchWorkloads {
                session_id: session.0.clone(),
            },
            |response| match response {
                ManagerResponse::WorkloadSnapshot { workloads } => Some(workloads),
                _ => None,
            },
        )
        .await
    }

    async fn watch_cluster_info(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<ClusterInfo>, ManagerError> {
        self.open_watch(
            ManagerRequest::WatchClusterInfo {
                session_id: session.0.clone(),
            },
            |response| match response {
                ManagerResponse::ClusterInfo { info } => Some(info),
                _ => None,
            },
        )
        .await
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
