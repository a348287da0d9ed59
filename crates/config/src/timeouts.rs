// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout descriptors and the typed timeout error.
//!
//! Every outgoing RPC is bounded by one of these descriptors. When a
//! deadline fires, the resulting error names the YAML key and the config
//! file that tunes it, so the message doubles as its own remedy.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::{format_duration, serde_duration};

/// Closed enumeration of tunable timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeoutId {
    AgentInstall,
    Apply,
    ClusterConnect,
    ConnectivityCheck,
    EndpointDial,
    Helm,
    Intercept,
    ProxyDial,
    RoundtripLatency,
    #[serde(rename = "trafficManagerAPI")]
    TrafficManagerApi,
    TrafficManagerConnect,
    FtpReadWrite,
    FtpShutdown,
}

impl TimeoutId {
    pub const ALL: [TimeoutId; 13] = [
        TimeoutId::AgentInstall,
        TimeoutId::Apply,
        TimeoutId::ClusterConnect,
        TimeoutId::ConnectivityCheck,
        TimeoutId::EndpointDial,
        TimeoutId::Helm,
        TimeoutId::Intercept,
        TimeoutId::ProxyDial,
        TimeoutId::RoundtripLatency,
        TimeoutId::TrafficManagerApi,
        TimeoutId::TrafficManagerConnect,
        TimeoutId::FtpReadWrite,
        TimeoutId::FtpShutdown,
    ];

    /// Key under the `timeouts` section.
    pub fn yaml_key(self) -> &'static str {
        match self {
            TimeoutId::AgentInstall => "agentInstall",
            TimeoutId::Apply => "apply",
            TimeoutId::ClusterConnect => "clusterConnect",
            TimeoutId::ConnectivityCheck => "connectivityCheck",
            TimeoutId::EndpointDial => "endpointDial",
            TimeoutId::Helm => "helm",
            TimeoutId::Intercept => "intercept",
            TimeoutId::ProxyDial => "proxyDial",
            TimeoutId::RoundtripLatency => "roundtripLatency",
            TimeoutId::TrafficManagerApi => "trafficManagerAPI",
            TimeoutId::TrafficManagerConnect => "trafficManagerConnect",
            TimeoutId::FtpReadWrite => "ftpReadWrite",
            TimeoutId::FtpShutdown => "ftpShutdown",
        }
    }

    /// Phrase used in the timeout error text.
    pub fn human_name(self) -> &'static str {
        match self {
            TimeoutId::AgentInstall => "traffic agent install",
            TimeoutId::Apply => "apply",
            TimeoutId::ClusterConnect => "cluster connect",
            TimeoutId::ConnectivityCheck => "connectivity check",
            TimeoutId::EndpointDial => "endpoint dial",
            TimeoutId::Helm => "helm operation",
            TimeoutId::Intercept => "intercept",
            TimeoutId::ProxyDial => "proxy dial",
            TimeoutId::RoundtripLatency => "roundtrip latency",
            TimeoutId::TrafficManagerApi => "traffic manager gRPC API",
            TimeoutId::TrafficManagerConnect => "traffic manager connect",
            TimeoutId::FtpReadWrite => "FTP read/write",
            TimeoutId::FtpShutdown => "FTP shutdown",
        }
    }

    pub fn default_duration(self) -> Duration {
        match self {
            TimeoutId::AgentInstall => Duration::from_secs(120),
            TimeoutId::Apply => Duration::from_secs(60),
            TimeoutId::ClusterConnect => Duration::from_secs(20),
            TimeoutId::ConnectivityCheck => Duration::from_millis(500),
            TimeoutId::EndpointDial => Duration::from_secs(3),
            TimeoutId::Helm => Duration::from_secs(120),
            TimeoutId::Intercept => Duration::from_secs(30),
            TimeoutId::ProxyDial => Duration::from_secs(5),
            TimeoutId::RoundtripLatency => Duration::from_secs(2),
            TimeoutId::TrafficManagerApi => Duration::from_secs(15),
            TimeoutId::TrafficManagerConnect => Duration::from_secs(60),
            TimeoutId::FtpReadWrite => Duration::from_secs(60),
            TimeoutId::FtpShutdown => Duration::from_secs(120),
        }
    }
}

/// Resolved timeout table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    values: BTreeMap<TimeoutId, Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            values: TimeoutId::ALL
                .iter()
                .map(|id| (*id, id.default_duration()))
                .collect(),
        }
    }
}

impl Timeouts {
    pub fn get(&self, id: TimeoutId) -> Duration {
        self.values
            .get(&id)
            .copied()
            .unwrap_or_else(|| id.default_duration())
    }

    pub fn set(&mut self, id: TimeoutId, value: Duration) {
        self.values.insert(id, value);
    }

    /// Entries differing from their defaults, for marshalling.
    pub fn overrides(&self) -> impl Iterator<Item = (TimeoutId, Duration)> + '_ {
        self.values
            .iter()
            .map(|(id, d)| (*id, *d))
            .filter(|(id, d)| *d != id.default_duration())
    }

    /// Build the typed error for an expired deadline under `id`.
    pub fn error(&self, id: TimeoutId, file: &Path) -> TimeoutError {
        TimeoutError {
            id,
            duration: self.get(id),
            file: file.to_path_buf(),
        }
    }

    /// Bound `fut` by the configured duration for `id`.
    pub async fn run<F, T>(&self, id: TimeoutId, file: &Path, fut: F) -> Result<T, TimeoutError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.get(id), fut)
            .await
            .map_err(|_| self.error(id, file))
    }
}

/// A deadline expired. Carries everything needed to tune it away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "the {} timed out. The current timeout {} can be configured as \"timeouts.{}\" in \"{}\"",
    .id.human_name(),
    format_duration(*.duration),
    .id.yaml_key(),
    .file.display()
)]
pub struct TimeoutError {
    pub id: TimeoutId,
    pub duration: Duration,
    pub file: PathBuf,
}

/// Per-file timeout overrides (all keys optional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutsFragment {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub agent_install: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub apply: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub cluster_connect: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub connectivity_check: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub endpoint_dial: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub helm: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub intercept: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub proxy_dial: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub roundtrip_latency: Option<Duration>,
    #[serde(
        default,
        rename = "trafficManagerAPI",
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub traffic_manager_api: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub traffic_manager_connect: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub ftp_read_write: Option<Duration>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub ftp_shutdown: Option<Duration>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl TimeoutsFragment {
    /// Right-biased overlay: `over`'s set keys win.
    pub fn merge(mut self, over: Self) -> Self {
        self.agent_install = over.agent_install.or(self.agent_install);
        self.apply = over.apply.or(self.apply);
        self.cluster_connect = over.cluster_connect.or(self.cluster_connect);
        self.connectivity_check = over.connectivity_check.or(self.connectivity_check);
        self.endpoint_dial = over.endpoint_dial.or(self.endpoint_dial);
        self.helm = over.helm.or(self.helm);
        self.intercept = over.intercept.or(self.intercept);
        self.proxy_dial = over.proxy_dial.or(self.proxy_dial);
        self.roundtrip_latency = over.roundtrip_latency.or(self.roundtrip_latency);
        self.traffic_manager_api = over.traffic_manager_api.or(self.traffic_manager_api);
        self.traffic_manager_connect = over
            .traffic_manager_connect
            .or(self.traffic_manager_connect);
        self.ftp_read_write = over.ftp_read_write.or(self.ftp_read_write);
        self.ftp_shutdown = over.ftp_shutdown.or(self.ftp_shutdown);
        self.unknown.extend(over.unknown);
        self
    }

    pub fn resolve(&self) -> Timeouts {
        let mut t = Timeouts::default();
        let pairs = [
            (TimeoutId::AgentInstall, self.agent_install),
            (TimeoutId::Apply, self.apply),
            (TimeoutId::ClusterConnect, self.cluster_connect),
            (TimeoutId::ConnectivityCheck, self.connectivity_check),
            (TimeoutId::EndpointDial, self.endpoint_dial),
            (TimeoutId::Helm, self.helm),
            (TimeoutId::Intercept, self.intercept),
            (TimeoutId::ProxyDial, self.proxy_dial),
            (TimeoutId::RoundtripLatency, self.roundtrip_latency),
            (TimeoutId::TrafficManagerApi, self.traffic_manager_api),
            (
                TimeoutId::TrafficManagerConnect,
                self.traffic_manager_connect,
            ),
            (TimeoutId::FtpReadWrite, self.ftp_read_write),
            (TimeoutId::FtpShutdown, self.ftp_shutdown),
        ];
        for (id, value) in pairs {
            if let Some(v) = value {
                t.set(id, v);
            }
        }
        t
    }

    /// Fragment containing only the non-default entries of `timeouts`.
    pub fn from_overrides(timeouts: &Timeouts) -> Self {
        let mut f = Self::default();
        for (id, d) in timeouts.overrides() {
            let slot = match id {
                TimeoutId::AgentInstall => &mut f.agent_install,
                TimeoutId::Apply => &mut f.apply,
                TimeoutId::ClusterConnect => &mut f.cluster_connect,
                TimeoutId::ConnectivityCheck => &mut f.connectivity_check,
                TimeoutId::EndpointDial => &mut f.endpoint_dial,
                TimeoutId::Helm => &mut f.helm,
                TimeoutId::Intercept => &mut f.intercept,
                TimeoutId::ProxyDial => &mut f.proxy_dial,
                TimeoutId::RoundtripLatency => &mut f.roundtrip_latency,
                TimeoutId::TrafficManagerApi => &mut f.traffic_manager_api,
                TimeoutId::TrafficManagerConnect => &mut f.traffic_manager_connect,
                TimeoutId::FtpReadWrite => &mut f.ftp_read_write,
                TimeoutId::FtpShutdown => &mut f.ftp_shutdown,
            };
            *slot = Some(d);
        }
        f
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
#[path = "timeouts_tests.rs"]
mod tests;
