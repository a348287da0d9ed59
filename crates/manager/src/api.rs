// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The traffic-manager API surface used by the session core.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use tp_core::{InterceptError, InterceptInfo, InterceptSpec, PreviewSpec, SessionId};

/// Major version of the manager API this client speaks.
pub const CLIENT_MAJOR_VERSION: u64 = 2;

/// Manager identity returned by `Version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

impl VersionInfo {
    /// Leading component of the semantic version, if parseable.
    pub fn major(&self) -> Option<u64> {
        self.version
            .trim_start_matches('v')
            .split('.')
            .next()
            .and_then(|s| s.parse().ok())
    }

    /// Whether this manager speaks a protocol this client understands.
    pub fn compatible(&self) -> bool {
        self.major() == Some(CLIENT_MAJOR_VERSION)
    }
}

/// What the client tells the manager when arriving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// `user@host`, for the manager's client listing.
    pub name: String,
    pub install_id: String,
    pub version: String,
}

/// Result of a successful arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrival {
    pub session: SessionId,
    /// Sessions idle longer than this are dropped by the manager; the
    /// remain period is derived from it.
    pub idle_timeout: Duration,
}

/// Result of preparing an intercept: mechanism reserved, pod selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedIntercept {
    pub pod_name: String,
    pub pod_port: u16,
    /// Environment collected from the selected pod.
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

/// One workload visible in a mapped namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadInfo {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub agent_installed: bool,
}

/// Cluster connectivity surface advertised by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_subnet: Option<String>,
    #[serde(default)]
    pub pod_subnets: Vec<String>,
    #[serde(default)]
    pub cluster_domain: String,
}

/// Failures talking to the manager.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ManagerError {
    #[error("traffic manager unavailable: {0}")]
    Unavailable(String),

    #[error("the session is no longer valid")]
    SessionInvalid,

    #[error(transparent)]
    Intercept(#[from] InterceptError),

    #[error("traffic manager protocol error: {0}")]
    Protocol(String),
}

/// The manager operations the session core depends on.
#[async_trait]
pub trait ManagerApi: Clone + Send + Sync + 'static {
    async fn version(&self) -> Result<VersionInfo, ManagerError>;

    /// Register this client and obtain a session.
    async fn arrive(&self, client: ClientInfo) -> Result<Arrival, ManagerError>;

    /// Keep-alive ping carrying the session.
    async fn remain(&self, session: &SessionId) -> Result<(), ManagerError>;

    /// Orderly goodbye; the manager drops the session.
    async fn depart(&self, session: &SessionId) -> Result<(), ManagerError>;

    /// Cheap validation round-trip before any user-visible side effect.
    async fn can_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<(), ManagerError>;

    /// Reserve the mechanism and select the pod for a spec.
    async fn prepare_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<PreparedIntercept, ManagerError>;

    /// Create the intercept cluster-side.
    async fn create_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<InterceptInfo, ManagerError>;

    /// Attach or update preview-URL parameters.
    async fn update_intercept(
        &self,
        session: &SessionId,
        name: &str,
        preview: Option<PreviewSpec>,
    ) -> Result<InterceptInfo, ManagerError>;

    /// Remove an intercept by name.
    async fn remove_intercept(&self, session: &SessionId, name: &str) -> Result<(), ManagerError>;

    /// One watch attempt; the stream ends when the server closes it.
    /// Reconnection with backoff is [`crate::watch::spawn_watch`]'s job.
    async fn watch_intercepts(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<Vec<InterceptInfo>>, ManagerError>;

    async fn watch_workloads(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<Vec<WorkloadInfo>>, ManagerError>;

    async fn watch_cluster_info(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<ClusterInfo>, ManagerError>;
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
