// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session records: the result of a successful connect.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque session identifier issued by the traffic manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the CLI asks the connector to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    /// Cluster context name from the kubeconfig.
    pub context: String,
    /// Namespace the traffic manager lives in.
    pub manager_namespace: String,
    /// Namespaces whose services are exposed to the workstation.
    #[serde(default)]
    pub mapped_namespaces: Vec<String>,
}

impl ConnectRequest {
    /// Two requests target the same session when context and namespace match.
    pub fn matches(&self, other: &ConnectRequest) -> bool {
        self.context == other.context && self.manager_namespace == other.manager_namespace
    }
}

/// A live session with the traffic manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub context: String,
    pub manager_namespace: String,
    pub client_version: String,
    pub manager_version: String,
    #[serde(default)]
    pub mapped_namespaces: Vec<String>,
}

/// Outcome code of a Connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectCode {
    /// No error.
    #[default]
    Unspecified,
    /// Already connected to the requested context and namespace.
    AlreadyConnected,
    /// Connected to a different context; disconnect first.
    ContextMismatch,
    /// The cluster could not be reached.
    ClusterUnreachable,
    /// The traffic manager could not be reached or installed.
    ManagerUnreachable,
    /// Manager major version is incompatible with this client.
    VersionMismatch,
    /// The cluster rejected the client's credentials. Returned to the CLI
    /// verbatim; the connector never retries this silently.
    Unauthenticated,
    /// A local daemon failed (root daemon unreachable, connector dying).
    DaemonFailed,
}

impl ConnectCode {
    pub fn is_error(self) -> bool {
        !matches!(self, ConnectCode::Unspecified | ConnectCode::AlreadyConnected)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
