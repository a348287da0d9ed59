// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the connector socket.
//!
//! One request per connection; requests are handled in spawned tasks
//! and funnel into the orchestrator's command channel, which serializes
//! all session mutation.

use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use tp_adapters::LogLevelHandle;
use tp_core::Failure;
use tp_ipc::wire::{self, WireError};
use tp_ipc::{ConnectorRequest, ConnectorResponse, DEFAULT_IPC_TIMEOUT};

use crate::rootd::RootClient;
use crate::session::OrchestratorHandle;
use crate::status;

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub orchestrator: OrchestratorHandle,
    pub root: RootClient,
    /// Absent in tests that don't install a subscriber.
    pub log_level: Option<LogLevelHandle>,
    pub shutdown: Arc<Notify>,
    pub version: String,
}

/// Listener task accepting connector-socket connections.
pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the accept loop until the task is dropped.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                WireError::ConnectionClosed => debug!("client disconnected"),
                                WireError::Timeout => warn!("connection timeout"),
                                _ => error!("connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), WireError> {
    let (mut reader, mut writer) = stream.into_split();

    // The receive cap is `grpc.maxReceiveSize`, read per connection so a
    // config reload applies without a restart.
    let cap = tp_config::current().grpc.max_receive_size.as_usize();
    let bytes = tokio::time::timeout(
        DEFAULT_IPC_TIMEOUT,
        wire::read_message_capped(&mut reader, cap),
    )
    .await
    .map_err(|_| WireError::Timeout)??;
    let request: ConnectorRequest = wire::decode(&bytes)?;
    if matches!(request, ConnectorRequest::Status) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;

    wire::write_timed(&mut writer, &response, DEFAULT_IPC_TIMEOUT).await
}

async fn handle_request(request: ConnectorRequest, ctx: &ListenCtx) -> ConnectorResponse {
    match request {
        ConnectorRequest::Version => ConnectorResponse::Version {
            version: ctx.version.clone(),
        },

        ConnectorRequest::Connect { request } => {
            let result = ctx.orchestrator.connect(request).await;
            ConnectorResponse::ConnectResult {
                code: result.code,
                message: result.message,
                session: result.session,
            }
        }

        ConnectorRequest::Disconnect => match ctx.orchestrator.disconnect().await {
            Ok(()) => ConnectorResponse::Disconnected,
            Err(failure) => ConnectorResponse::Error { failure },
        },

        ConnectorRequest::Status => ConnectorResponse::Status {
            status: Box::new(
                status::assemble_status(&ctx.orchestrator, &ctx.root, &ctx.version).await,
            ),
        },

        ConnectorRequest::CreateIntercept { spec } => {
            match ctx.orchestrator.create_intercept(spec).await {
                Ok(info) => ConnectorResponse::Intercept {
                    info: Box::new(info),
                },
                Err(failure) => ConnectorResponse::Error { failure },
            }
        }

        ConnectorRequest::RemoveIntercept { name } => {
            match ctx.orchestrator.remove_intercept(name.clone()).await {
                Ok(()) => ConnectorResponse::InterceptRemoved { name },
                Err(failure) => ConnectorResponse::Error { failure },
            }
        }

        ConnectorRequest::SetContainer { name, container } => {
            ctx.orchestrator.mark_container(name, container);
            ConnectorResponse::Ok
        }

        ConnectorRequest::ListIntercepts => {
            let snapshot = ctx.orchestrator.snapshot().await;
            ConnectorResponse::Intercepts {
                intercepts: snapshot.intercepts,
            }
        }

        ConnectorRequest::SetLogLevel { level, duration } => {
            let result = match &ctx.log_level {
                Some(handle) => handle
                    .set(&level, duration)
                    .map_err(|e| Failure::user(e.to_string())),
                None => Err(Failure::new("log level control is not available")),
            };
            // The root daemon follows, best-effort.
            if result.is_ok() {
                if let Err(e) = ctx.root.set_log_level(&level, duration).await {
                    debug!(error = %e, "root daemon log level not changed");
                }
            }
            match result {
                Ok(()) => ConnectorResponse::Ok,
                Err(failure) => ConnectorResponse::Error { failure },
            }
        }

        ConnectorRequest::Quit => {
            ctx.orchestrator.quit().await;
            ctx.shutdown.notify_one();
            ConnectorResponse::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
