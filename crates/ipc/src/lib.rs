// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tp-ipc: local-socket transport between the CLI and the daemons.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload, over
//! Unix domain sockets at well-known paths. Authentication is the local
//! user's file permissions; nothing else.

pub mod dial;
pub mod proto;
pub mod socket;
pub mod wire;

pub use dial::{dial, probe, DialError};
pub use proto::{
    ConnectionState, ConnectorRequest, ConnectorResponse, ConnectorStatus, DnsSpec, ManagerInfo,
    RootRequest, RootResponse, RootStatus,
};
pub use socket::{bind, connector_socket, root_socket};
pub use wire::{
    decode, encode, read_message, read_message_capped, read_timed, write_message, write_timed,
    WireError, DEFAULT_IPC_TIMEOUT, DEFAULT_MAX_MESSAGE_SIZE,
};

/// Protocol version exchanged in Version handshakes.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");
