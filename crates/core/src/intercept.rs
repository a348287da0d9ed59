// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intercept specs and server-acknowledged intercept records.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::port::PortSpec;

/// Environment variable exporting the intercept id to handler processes.
pub const ENV_INTERCEPT_ID: &str = "TELEPRESENCE_INTERCEPT_ID";

/// Environment variable exporting the mount root to handler processes.
pub const ENV_ROOT: &str = "TELEPRESENCE_ROOT";

/// Server-assigned intercept identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterceptId(pub String);

impl fmt::Display for InterceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the workload whose traffic is redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.kind, self.name, self.namespace)
    }
}

/// How (and whether) the intercepted pod's filesystem is mounted locally.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountPolicy {
    /// Pick a platform-appropriate temp directory.
    #[default]
    Auto,
    /// No mount, explicitly requested.
    Disabled,
    /// Mount at this exact path.
    Path(PathBuf),
}

impl MountPolicy {
    /// Parse the `--mount` flag value: `true`, `false`, or a verbatim path.
    pub fn parse(value: &str) -> Self {
        match value {
            "true" => MountPolicy::Auto,
            "false" => MountPolicy::Disabled,
            other => MountPolicy::Path(PathBuf::from(other)),
        }
    }

    pub fn enabled(&self) -> bool {
        !matches!(self, MountPolicy::Disabled)
    }
}

/// User-requested redirection, as validated by the intercept manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptSpec {
    /// Unique within the session.
    pub name: String,
    pub workload: WorkloadRef,
    pub port: PortSpec,
    /// Address the redirected traffic is sent to on the workstation.
    #[serde(default = "default_target_host")]
    pub target_host: String,
    /// Mechanism label reserved on the agent (e.g. "tcp", "http").
    #[serde(default = "default_mechanism")]
    pub mechanism: String,
    /// Mechanism-specific arguments, passed through verbatim.
    #[serde(default)]
    pub mechanism_args: Vec<String>,
    #[serde(default)]
    pub mount: MountPolicy,
    /// Extra pod ports forwarded to the workstation alongside the intercept.
    #[serde(default)]
    pub extra_ports: Vec<u16>,
    /// No server interaction: record locally and return.
    #[serde(default)]
    pub local_only: bool,
    /// Preview-URL parameters, opaque to the session core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<PreviewSpec>,
}

fn default_target_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mechanism() -> String {
    "tcp".to_string()
}

/// Preview-URL parameters forwarded to the manager on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSpec {
    pub ingress_host: String,
    pub ingress_port: u16,
    #[serde(default)]
    pub ingress_tls: bool,
}

/// Cluster-side intercept state as advertised by the manager's watch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Prepared,
    Waiting,
    Active,
    BadArgs,
    NoAgent,
    Failed,
    Removed,
}

impl Disposition {
    /// While waiting or active, exactly one local port binding and at most
    /// one mount exist for the intercept.
    pub fn holds_resources(self) -> bool {
        matches!(self, Disposition::Waiting | Disposition::Active)
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            Disposition::BadArgs | Disposition::NoAgent | Disposition::Failed
        )
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Disposition::Prepared => "PREPARED",
            Disposition::Waiting => "WAITING",
            Disposition::Active => "ACTIVE",
            Disposition::BadArgs => "BAD_ARGS",
            Disposition::NoAgent => "NO_AGENT",
            Disposition::Failed => "FAILED",
            Disposition::Removed => "REMOVED",
        };
        f.write_str(s)
    }
}

/// Server-acknowledged instance of a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptInfo {
    pub id: InterceptId,
    pub spec: InterceptSpec,
    pub disposition: Disposition,
    /// Message explaining the disposition, empty while healthy.
    #[serde(default)]
    pub message: String,
    /// Environment collected from the intercepted pod.
    #[serde(default)]
    pub environment: HashMap<String, String>,
    /// Mount point on the workstation, when mounted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<PathBuf>,
}

impl InterceptInfo {
    /// Environment exported to a handler process: everything collected
    /// from the intercepted pod plus the telepresence markers.
    pub fn handler_environment(&self) -> HashMap<String, String> {
        let mut env = self.environment.clone();
        env.insert(ENV_INTERCEPT_ID.to_string(), self.id.0.clone());
        let root = self
            .mount_point
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        env.insert(ENV_ROOT.to_string(), root);
        env
    }
}

/// Closed set of intercept failure codes surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterceptCode {
    Unspecified,
    AlreadyExists,
    LocalTargetInUse,
    NoAcceptableWorkload,
    AmbiguousMatch,
    FailedToEstablish,
    UnsupportedWorkload,
    NotFound,
    MountPointBusy,
    MisconfiguredWorkload,
    UnknownFlag,
}

/// An intercept failure: a code plus the one-line text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct InterceptError {
    pub code: InterceptCode,
    pub message: String,
}

impl From<InterceptError> for crate::category::Failure {
    fn from(err: InterceptError) -> Self {
        crate::category::Failure {
            message: err.message,
            category: crate::category::Category::User,
            code: Some(err.code),
        }
    }
}

impl InterceptError {
    pub fn new(code: InterceptCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The canonical port-conflict error.
    pub fn local_target_in_use(host: &str, port: u16, holder: &str) -> Self {
        Self::new(
            InterceptCode::LocalTargetInUse,
            format!("Port {host}:{port} is already in use by intercept {holder}"),
        )
    }
}

#[cfg(test)]
#[path = "intercept_tests.rs"]
mod tests;
