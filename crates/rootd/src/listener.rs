// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the root socket.
//!
//! One request per connection, handled in a spawned task so a slow
//! client never blocks the accept loop.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use tp_adapters::LogLevelHandle;
use tp_core::Failure;
use tp_ipc::wire::{self, WireError};
use tp_ipc::{RootRequest, RootResponse, DEFAULT_IPC_TIMEOUT, PROTOCOL_VERSION};

use crate::network::NetworkState;

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub network: Arc<Mutex<NetworkState>>,
    /// Absent in tests that don't install a subscriber.
    pub log_level: Option<LogLevelHandle>,
    pub shutdown: Arc<Notify>,
}

/// Listener task accepting root-socket connections.
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

    let request: RootRequest = wire::read_timed(&mut reader, DEFAULT_IPC_TIMEOUT).await?;
    debug!(request = ?request, "received request");

    let response = handle_request(request, ctx);

    wire::write_timed(&mut writer, &response, DEFAULT_IPC_TIMEOUT).await
}

fn handle_request(request: RootRequest, ctx: &ListenCtx) -> RootResponse {
    match request {
        RootRequest::Version => RootResponse::Version {
            version: PROTOCOL_VERSION.to_string(),
        },

        RootRequest::OpenNetwork {
            session_id,
            dns,
            also_proxy,
            never_proxy,
            allow_conflicting,
        } => {
            let result = ctx.network.lock().open(
                session_id,
                dns,
                also_proxy,
                never_proxy,
                allow_conflicting,
            );
            match result {
                Ok(()) => RootResponse::Ok,
                Err(e) => RootResponse::Error {
                    failure: Failure::new(e.to_string()),
                },
            }
        }

        RootRequest::CloseNetwork => {
            ctx.network.lock().close();
            RootResponse::Ok
        }

        RootRequest::SetDnsSuffixes { suffixes } => {
            match ctx.network.lock().set_dns_suffixes(suffixes) {
                Ok(()) => RootResponse::Ok,
                Err(e) => RootResponse::Error {
                    failure: Failure::new(e.to_string()),
                },
            }
        }

        RootRequest::AddSubnets { subnets } => match ctx.network.lock().add_subnets(subnets) {
            Ok(()) => RootResponse::Ok,
            Err(e) => RootResponse::Error {
                failure: Failure::new(e.to_string()),
            },
        },

        RootRequest::ClearSubnets => {
            ctx.network.lock().clear_subnets();
            RootResponse::Ok
        }

        RootRequest::Status => RootResponse::Status {
            status: Box::new(ctx.network.lock().status(PROTOCOL_VERSION)),
        },

        RootRequest::SetLogLevel { level, duration } => match &ctx.log_level {
            Some(handle) => match handle.set(&level, duration) {
                Ok(()) => RootResponse::Ok,
                Err(e) => RootResponse::Error {
                    failure: Failure::user(e.to_string()),
                },
            },
            None => RootResponse::Error {
                failure: Failure::new("log level control is not available"),
            },
        },

        RootRequest::Quit => {
            ctx.shutdown.notify_one();
            RootResponse::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
