// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol types for both daemons.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tp_core::{ConnectCode, ConnectRequest, Failure, InterceptInfo, InterceptSpec, SessionInfo};

/// Request from the CLI to the user daemon (connector).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ConnectorRequest {
    /// Version handshake.
    Version,

    /// Establish (or re-use) a session.
    Connect { request: ConnectRequest },

    /// Tear the current session down.
    Disconnect,

    /// Snapshot of daemons, session, and intercepts.
    Status,

    /// Validate and create an intercept.
    CreateIntercept { spec: InterceptSpec },

    /// Remove an intercept by name.
    RemoveIntercept { name: String },

    /// List intercepts of the current session.
    ListIntercepts,

    /// Record the docker container handling an intercept, so leaving the
    /// intercept stops the container first.
    SetContainer { name: String, container: String },

    /// Raise (or restore) the daemon log level.
    SetLogLevel {
        level: String,
        /// Revert after this long; `None` keeps it until the next change.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<Duration>,
    },

    /// Disconnect and stop the daemon.
    Quit,
}

/// Response from the user daemon to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ConnectorResponse {
    Version {
        version: String,
    },

    ConnectResult {
        code: ConnectCode,
        #[serde(default)]
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session: Option<SessionInfo>,
    },

    Disconnected,

    Status {
        status: Box<ConnectorStatus>,
    },

    Intercept {
        info: Box<InterceptInfo>,
    },

    InterceptRemoved {
        name: String,
    },

    Intercepts {
        intercepts: Vec<InterceptInfo>,
    },

    Ok,

    ShuttingDown,

    Error {
        failure: Failure,
    },
}

/// Connection state as reported by the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

/// Traffic-manager identity for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerInfo {
    pub name: String,
    pub version: String,
}

/// Connector-side status snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectorStatus {
    pub version: String,
    pub state: ConnectionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerInfo>,
    /// Traffic-agent image FQN the manager would install.
    #[serde(default)]
    pub agent_image: String,
    #[serde(default)]
    pub mapped_namespaces: Vec<String>,
    #[serde(default)]
    pub intercepts: Vec<InterceptInfo>,
    /// Root-daemon view, when reachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<RootStatus>,
}

/// DNS overrides handed to the root daemon when the network opens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DnsSpec {
    #[serde(default)]
    pub include_suffixes: Vec<String>,
    #[serde(default)]
    pub exclude_suffixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_address: Option<String>,
}

/// Request from the user daemon to the root daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RootRequest {
    /// Version handshake.
    Version,

    /// Program the virtual network for a session.
    OpenNetwork {
        session_id: String,
        dns: DnsSpec,
        #[serde(default)]
        also_proxy: Vec<String>,
        #[serde(default)]
        never_proxy: Vec<String>,
        #[serde(default)]
        allow_conflicting: Vec<String>,
    },

    /// Tear the virtual network down.
    CloseNetwork,

    /// Replace the DNS suffixes resolved through the cluster.
    SetDnsSuffixes { suffixes: Vec<String> },

    /// Route additional cluster subnets through the virtual interface.
    AddSubnets { subnets: Vec<String> },

    /// Drop all routed subnets.
    ClearSubnets,

    /// DNS and routing snapshot.
    Status,

    /// Raise (or restore) the daemon log level.
    SetLogLevel {
        level: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<Duration>,
    },

    /// Stop the daemon. Sent by the CLI during shutdown only.
    Quit,
}

/// Response from the root daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RootResponse {
    Version { version: String },

    Ok,

    Status { status: Box<RootStatus> },

    ShuttingDown,

    Error { failure: Failure },
}

/// Root-daemon status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RootStatus {
    pub version: String,
    /// Whether the virtual network is programmed for a session.
    pub programmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub dns: DnsSpec,
    /// Subnets currently routed through the virtual interface.
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub also_proxy: Vec<String>,
    #[serde(default)]
    pub never_proxy: Vec<String>,
    #[serde(default)]
    pub allow_conflicting: Vec<String>,
}

#[cfg(test)]
#[path = "proto_tests.rs"]
mod tests;
