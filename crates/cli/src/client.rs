// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connector client for CLI commands

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use tp_core::{Category, ConnectCode, ConnectRequest, Failure, InterceptInfo, InterceptSpec, SessionInfo};
use tp_ipc::wire::{self, WireError};
use tp_ipc::{dial, ConnectorRequest, ConnectorResponse, ConnectorStatus, DialError};
use tp_ipc::DEFAULT_IPC_TIMEOUT;

/// Client errors, categorized for the CLI's error reporting.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Dial(#[from] DialError),

    #[error("daemon protocol error: {0}")]
    Wire(#[from] WireError),

    #[error("{0}")]
    Daemon(Failure),

    #[error("{0}")]
    Connect(String),

    #[error("failed to start the user daemon: {0}")]
    StartFailed(String),

    #[error("unexpected response from the user daemon")]
    UnexpectedResponse,
}

impl ClientError {
    pub fn category(&self) -> Category {
        match self {
            ClientError::Daemon(failure) => failure.category,
            ClientError::Connect(_) => Category::NoDaemonLogs,
            ClientError::Dial(_) => Category::NoDaemonLogs,
            ClientError::StartFailed(_) => Category::NoDaemonLogs,
            _ => Category::Unknown,
        }
    }

    /// Structured intercept code, when the daemon sent one.
    pub fn intercept_code(&self) -> Option<tp_core::InterceptCode> {
        match self {
            ClientError::Daemon(failure) => failure.code,
            _ => None,
        }
    }
}

/// What Connect returned.
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    pub code: ConnectCode,
    pub session: Option<SessionInfo>,
}

/// One-shot-request client over the connector socket.
pub struct ConnectorClient {
    socket_path: PathBuf,
}

impl ConnectorClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// Client for the well-known connector socket.
    pub fn from_env() -> Self {
        Self::new(tp_ipc::socket::connector_socket())
    }

    pub async fn send(&self, request: &ConnectorRequest) -> Result<ConnectorResponse, ClientError> {
        let stream = dial(&self.socket_path, "user daemon", DEFAULT_IPC_TIMEOUT).await?;
        let (mut reader, mut writer) = stream.into_split();
        wire::write_timed(&mut writer, request, DEFAULT_IPC_TIMEOUT).await?;
        let response = wire::read_timed(&mut reader, DEFAULT_IPC_TIMEOUT).await?;
        match response {
            ConnectorResponse::Error { failure } => Err(ClientError::Daemon(failure)),
            other => Ok(other),
        }
    }

    async fn send_simple(&self, request: &ConnectorRequest) -> Result<(), ClientError> {
        match self.send(request).await? {
            ConnectorResponse::Ok => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn version(&self) -> Result<String, ClientError> {
        match self.send(&ConnectorRequest::Version).await? {
            ConnectorResponse::Version { version } => Ok(version),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn connect(&self, request: ConnectRequest) -> Result<ConnectOutcome, ClientError> {
        match self.send(&ConnectorRequest::Connect { request }).await? {
            ConnectorResponse::ConnectResult {
                code,
                message,
                session,
            } => {
                if code.is_error() {
                    return Err(ClientError::Connect(message));
                }
                Ok(ConnectOutcome { code, session })
            }
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn disconnect(&self) -> Result<(), ClientError> {
        match self.send(&ConnectorRequest::Disconnect).await? {
            ConnectorResponse::Disconnected => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn status(&self) -> Result<ConnectorStatus, ClientError> {
        match self.send(&ConnectorRequest::Status).await? {
            ConnectorResponse::Status { status } => Ok(*status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn create_intercept(
        &self,
        spec: InterceptSpec,
    ) -> Result<InterceptInfo, ClientError> {
        match self.send(&ConnectorRequest::CreateIntercept { spec }).await? {
            ConnectorResponse::Intercept { info } => Ok(*info),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn remove_intercept(&self, name: &str) -> Result<(), ClientError> {
        match self
            .send(&ConnectorRequest::RemoveIntercept {
                name: name.to_string(),
            })
            .await?
        {
            ConnectorResponse::InterceptRemoved { .. } => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn list_intercepts(&self) -> Result<Vec<InterceptInfo>, ClientError> {
        match self.send(&ConnectorRequest::ListIntercepts).await? {
            ConnectorResponse::Intercepts { intercepts } => Ok(intercepts),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn set_container(&self, name: &str, container: &str) -> Result<(), ClientError> {
        self.send_simple(&ConnectorRequest::SetContainer {
            name: name.to_string(),
            container: container.to_string(),
        })
        .await
    }

    pub async fn set_log_level(
        &self,
        level: &str,
        duration: Option<Duration>,
    ) -> Result<(), ClientError> {
        self.send_simple(&ConnectorRequest::SetLogLevel {
            level: level.to_string(),
            duration,
        })
        .await
    }

    pub async fn quit(&self) -> Result<(), ClientError> {
        match self.send(&ConnectorRequest::Quit).await? {
            ConnectorResponse::ShuttingDown | ConnectorResponse::Ok => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
