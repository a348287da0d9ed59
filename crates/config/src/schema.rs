// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration schema: per-file fragments with optional keys, and the
//! resolved tree with every section filled in at its default.
//!
//! Fragments merge right-biased (a later file's explicitly-set keys win),
//! which keeps the merge associative under defaulted values. Marshalling
//! goes back through a fragment so keys equal to their defaults are
//! omitted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bytes::ByteSize;
use crate::duration::serde_duration;
use crate::timeouts::{Timeouts, TimeoutsFragment};

/// Daemon log levels accepted by the `logLevels` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!(
                "invalid log level {other:?}: expected trace|debug|info|warn|error"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// How the app protocol of an intercepted service port is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppProtocolStrategy {
    #[default]
    Http2Probe,
    PortName,
    Http,
    Http2,
}

macro_rules! overlay {
    ($base:ident, $over:ident, $($field:ident),+ $(,)?) => {
        $( $base.$field = $over.$field.or($base.$field); )+
        $base.unknown.extend($over.unknown);
    };
}

/// Resolved `logLevels` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogLevels {
    pub user_daemon: LogLevel,
    pub root_daemon: LogLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLevelsFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_daemon: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_daemon: Option<LogLevel>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl LogLevelsFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(self, over, user_daemon, root_daemon);
        self
    }

    fn resolve(&self) -> LogLevels {
        LogLevels {
            user_daemon: self.user_daemon.unwrap_or_default(),
            root_daemon: self.root_daemon.unwrap_or_default(),
        }
    }
}

/// Resolved `images` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Images {
    pub registry: String,
    pub agent_image: String,
    pub client_image: String,
    pub webhook_registry: String,
}

pub const DEFAULT_REGISTRY: &str = "docker.io/datawire";

impl Default for Images {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            agent_image: String::new(),
            client_image: String::new(),
            webhook_registry: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_registry: Option<String>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl ImagesFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(
            self,
            over,
            registry,
            agent_image,
            client_image,
            webhook_registry
        );
        self
    }

    fn resolve(&self) -> Images {
        let d = Images::default();
        Images {
            registry: self.registry.clone().unwrap_or(d.registry),
            agent_image: self.agent_image.clone().unwrap_or(d.agent_image),
            client_image: self.client_image.clone().unwrap_or(d.client_image),
            webhook_registry: self.webhook_registry.clone().unwrap_or(d.webhook_registry),
        }
    }
}

/// Resolved `cloud` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cloud {
    pub skip_login: bool,
    pub refresh_messages: Duration,
    pub systema_host: String,
    pub systema_port: u16,
}

impl Default for Cloud {
    fn default() -> Self {
        Self {
            skip_login: false,
            refresh_messages: Duration::from_secs(24 * 3600),
            systema_host: "app.getambassador.io".to_string(),
            systema_port: 443,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_login: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_duration::option"
    )]
    pub refresh_messages: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systema_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systema_port: Option<u16>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl CloudFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(
            self,
            over,
            skip_login,
            refresh_messages,
            systema_host,
            systema_port
        );
        self
    }

    fn resolve(&self) -> Cloud {
        let d = Cloud::default();
        Cloud {
            skip_login: self.skip_login.unwrap_or(d.skip_login),
            refresh_messages: self.refresh_messages.unwrap_or(d.refresh_messages),
            systema_host: self.systema_host.clone().unwrap_or(d.systema_host),
            systema_port: self.systema_port.unwrap_or(d.systema_port),
        }
    }
}

/// Resolved `grpc` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grpc {
    pub max_receive_size: ByteSize,
}

impl Default for Grpc {
    fn default() -> Self {
        Self {
            max_receive_size: ByteSize(4 << 20),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_receive_size: Option<ByteSize>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl GrpcFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(self, over, max_receive_size);
        self
    }

    fn resolve(&self) -> Grpc {
        Grpc {
            max_receive_size: self
                .max_receive_size
                .unwrap_or(Grpc::default().max_receive_size),
        }
    }
}

/// Resolved `telepresenceAPI` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelepresenceApi {
    /// Port of the local REST API exposed to intercepted processes; 0 is off.
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelepresenceApiFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl TelepresenceApiFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(self, over, port);
        self
    }

    fn resolve(&self) -> TelepresenceApi {
        TelepresenceApi {
            port: self.port.unwrap_or_default(),
        }
    }
}

/// Resolved `intercept` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptDefaults {
    pub app_protocol_strategy: AppProtocolStrategy,
    pub default_port: u16,
    pub use_ftp: bool,
}

impl Default for InterceptDefaults {
    fn default() -> Self {
        Self {
            app_protocol_strategy: AppProtocolStrategy::default(),
            default_port: 8080,
            use_ftp: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_protocol_strategy: Option<AppProtocolStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_ftp: Option<bool>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl InterceptFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(
            self,
            over,
            app_protocol_strategy,
            default_port,
            use_ftp
        );
        self
    }

    fn resolve(&self) -> InterceptDefaults {
        let d = InterceptDefaults::default();
        InterceptDefaults {
            app_protocol_strategy: self.app_protocol_strategy.unwrap_or(d.app_protocol_strategy),
            default_port: self.default_port.unwrap_or(d.default_port),
            use_ftp: self.use_ftp.unwrap_or(d.use_ftp),
        }
    }
}

/// Resolved `cluster` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDefaults {
    pub default_manager_namespace: String,
    pub mapped_namespaces: Vec<String>,
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        Self {
            default_manager_namespace: "ambassador".to_string(),
            mapped_namespaces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_manager_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_namespaces: Option<Vec<String>>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl ClusterFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(self, over, default_manager_namespace, mapped_namespaces);
        self
    }

    fn resolve(&self) -> ClusterDefaults {
        let d = ClusterDefaults::default();
        ClusterDefaults {
            default_manager_namespace: self
                .default_manager_namespace
                .clone()
                .unwrap_or(d.default_manager_namespace),
            mapped_namespaces: self.mapped_namespaces.clone().unwrap_or(d.mapped_namespaces),
        }
    }
}

/// Resolved `routing` section: subnet overrides for the virtual network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Routing {
    pub also_proxy: Vec<String>,
    pub never_proxy: Vec<String>,
    pub allow_conflicting: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub also_proxy: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub never_proxy: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_conflicting: Option<Vec<String>>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl RoutingFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(self, over, also_proxy, never_proxy, allow_conflicting);
        self
    }

    fn resolve(&self) -> Routing {
        Routing {
            also_proxy: self.also_proxy.clone().unwrap_or_default(),
            never_proxy: self.never_proxy.clone().unwrap_or_default(),
            allow_conflicting: self.allow_conflicting.clone().unwrap_or_default(),
        }
    }
}

/// Resolved `dns` section: overrides passed to the root daemon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dns {
    pub include_suffixes: Vec<String>,
    pub exclude_suffixes: Vec<String>,
    pub local_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_suffixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_suffixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_address: Option<String>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl DnsFragment {
    fn merge(mut self, over: Self) -> Self {
        overlay!(self, over, include_suffixes, exclude_suffixes, local_address);
        self
    }

    fn resolve(&self) -> Dns {
        Dns {
            include_suffixes: self.include_suffixes.clone().unwrap_or_default(),
            exclude_suffixes: self.exclude_suffixes.clone().unwrap_or_default(),
            local_address: self.local_address.clone(),
        }
    }
}

/// One file's worth of configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<TimeoutsFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_levels: Option<LogLevelsFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImagesFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<CloudFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcFragment>,
    #[serde(
        default,
        rename = "telepresenceAPI",
        skip_serializing_if = "Option::is_none"
    )]
    pub telepresence_api: Option<TelepresenceApiFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intercept: Option<InterceptFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsFragment>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

fn merge_section<T>(base: Option<T>, over: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, over) {
        (Some(b), Some(o)) => Some(merge(b, o)),
        (b, o) => o.or(b),
    }
}

impl ConfigFragment {
    /// Right-biased overlay of two fragments.
    pub fn merge(self, over: Self) -> Self {
        let mut unknown = self.unknown;
        unknown.extend(over.unknown);
        Self {
            timeouts: merge_section(self.timeouts, over.timeouts, TimeoutsFragment::merge),
            log_levels: merge_section(self.log_levels, over.log_levels, LogLevelsFragment::merge),
            images: merge_section(self.images, over.images, ImagesFragment::merge),
            cloud: merge_section(self.cloud, over.cloud, CloudFragment::merge),
            grpc: merge_section(self.grpc, over.grpc, GrpcFragment::merge),
            telepresence_api: merge_section(
                self.telepresence_api,
                over.telepresence_api,
                TelepresenceApiFragment::merge,
            ),
            intercept: merge_section(self.intercept, over.intercept, InterceptFragment::merge),
            cluster: merge_section(self.cluster, over.cluster, ClusterFragment::merge),
            routing: merge_section(self.routing, over.routing, RoutingFragment::merge),
            dns: merge_section(self.dns, over.dns, DnsFragment::merge),
            unknown,
        }
    }

    /// Log a warning for every unrecognized key found in `file`.
    pub fn warn_unknown(&self, file: &std::path::Path) {
        let mut keys: Vec<String> = self.unknown.keys().cloned().collect();
        let sections: [(&str, Option<&BTreeMap<String, serde_yaml::Value>>); 10] = [
            ("timeouts", self.timeouts.as_ref().map(|s| &s.unknown)),
            ("logLevels", self.log_levels.as_ref().map(|s| &s.unknown)),
            ("images", self.images.as_ref().map(|s| &s.unknown)),
            ("cloud", self.cloud.as_ref().map(|s| &s.unknown)),
            ("grpc", self.grpc.as_ref().map(|s| &s.unknown)),
            (
                "telepresenceAPI",
                self.telepresence_api.as_ref().map(|s| &s.unknown),
            ),
            ("intercept", self.intercept.as_ref().map(|s| &s.unknown)),
            ("cluster", self.cluster.as_ref().map(|s| &s.unknown)),
            ("routing", self.routing.as_ref().map(|s| &s.unknown)),
            ("dns", self.dns.as_ref().map(|s| &s.unknown)),
        ];
        for (section, unknown) in sections {
            if let Some(unknown) = unknown {
                keys.extend(unknown.keys().map(|k| format!("{section}.{k}")));
            }
        }
        for key in keys {
            warn!(file = %file.display(), key, "ignoring unknown configuration key");
        }
    }

    /// Resolve against defaults.
    pub fn resolve(&self) -> ClientConfig {
        ClientConfig {
            timeouts: self
                .timeouts
                .as_ref()
                .map(TimeoutsFragment::resolve)
                .unwrap_or_default(),
            log_levels: self
                .log_levels
                .as_ref()
                .map(LogLevelsFragment::resolve)
                .unwrap_or_default(),
            images: self
                .images
                .as_ref()
                .map(ImagesFragment::resolve)
                .unwrap_or_default(),
            cloud: self
                .cloud
                .as_ref()
                .map(CloudFragment::resolve)
                .unwrap_or_default(),
            grpc: self
                .grpc
                .as_ref()
                .map(GrpcFragment::resolve)
                .unwrap_or_default(),
            telepresence_api: self
                .telepresence_api
                .as_ref()
                .map(TelepresenceApiFragment::resolve)
                .unwrap_or_default(),
            intercept: self
                .intercept
                .as_ref()
                .map(InterceptFragment::resolve)
                .unwrap_or_default(),
            cluster: self
                .cluster
                .as_ref()
                .map(ClusterFragment::resolve)
                .unwrap_or_default(),
            routing: self
                .routing
                .as_ref()
                .map(RoutingFragment::resolve)
                .unwrap_or_default(),
            dns: self
                .dns
                .as_ref()
                .map(DnsFragment::resolve)
                .unwrap_or_default(),
            source_file: None,
        }
    }
}

/// The fully-resolved client configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientConfig {
    pub timeouts: Timeouts,
    pub log_levels: LogLevels,
    pub images: Images,
    pub cloud: Cloud,
    pub grpc: Grpc,
    pub telepresence_api: TelepresenceApi,
    pub intercept: InterceptDefaults,
    pub cluster: ClusterDefaults,
    pub routing: Routing,
    pub dns: Dns,
    /// The user config file that tunes this configuration. Present even
    /// when the file does not exist yet; timeout errors point here.
    pub source_file: Option<PathBuf>,
}

impl ClientConfig {
    /// The path named in timeout errors.
    pub fn tuning_file(&self) -> PathBuf {
        self.source_file
            .clone()
            .or_else(crate::load::user_config_file)
            .unwrap_or_else(|| PathBuf::from(crate::CONFIG_FILE))
    }

    /// Build the typed error for an expired deadline under `id`.
    pub fn timeout_error(&self, id: crate::timeouts::TimeoutId) -> crate::timeouts::TimeoutError {
        self.timeouts.error(id, &self.tuning_file())
    }

    /// Bound `fut` by the configured duration for `id`.
    pub async fn bounded<F, T>(
        &self,
        id: crate::timeouts::TimeoutId,
        fut: F,
    ) -> Result<T, crate::timeouts::TimeoutError>
    where
        F: std::future::Future<Output = T>,
    {
        self.timeouts.run(id, &self.tuning_file(), fut).await
    }

    /// Fragment holding only the keys that differ from defaults.
    pub fn to_fragment(&self) -> ConfigFragment {
        fn non_default<T: Default + PartialEq>(value: T) -> Option<T> {
            (value != T::default()).then_some(value)
        }

        let d = ClientConfig::default();
        ConfigFragment {
            timeouts: {
                let f = TimeoutsFragment::from_overrides(&self.timeouts);
                (!f.is_empty()).then_some(f)
            },
            log_levels: non_default(LogLevelsFragment {
                user_daemon: non_default(self.log_levels.user_daemon),
                root_daemon: non_default(self.log_levels.root_daemon),
                unknown: BTreeMap::new(),
            }),
            images: non_default(ImagesFragment {
                registry: (self.images.registry != d.images.registry)
                    .then(|| self.images.registry.clone()),
                agent_image: (!self.images.agent_image.is_empty())
                    .then(|| self.images.agent_image.clone()),
                client_image: (!self.images.client_image.is_empty())
                    .then(|| self.images.client_image.clone()),
                webhook_registry: (!self.images.webhook_registry.is_empty())
                    .then(|| self.images.webhook_registry.clone()),
                unknown: BTreeMap::new(),
            }),
            cloud: non_default(CloudFragment {
                skip_login: (self.cloud.skip_login != d.cloud.skip_login)
                    .then_some(self.cloud.skip_login),
                refresh_messages: (self.cloud.refresh_messages != d.cloud.refresh_messages)
                    .then_some(self.cloud.refresh_messages),
                systema_host: (self.cloud.systema_host != d.cloud.systema_host)
                    .then(|| self.cloud.systema_host.clone()),
                systema_port: (self.cloud.systema_port != d.cloud.systema_port)
                    .then_some(self.cloud.systema_port),
                unknown: BTreeMap::new(),
            }),
            grpc: non_default(GrpcFragment {
                max_receive_size: (self.grpc.max_receive_size != d.grpc.max_receive_size)
                    .then_some(self.grpc.max_receive_size),
                unknown: BTreeMap::new(),
            }),
            telepresence_api: non_default(TelepresenceApiFragment {
                port: non_default(self.telepresence_api.port),
                unknown: BTreeMap::new(),
            }),
            intercept: non_default(InterceptFragment {
                app_protocol_strategy: non_default(self.intercept.app_protocol_strategy),
                default_port: (self.intercept.default_port != d.intercept.default_port)
                    .then_some(self.intercept.default_port),
                use_ftp: non_default(self.intercept.use_ftp),
                unknown: BTreeMap::new(),
            }),
            cluster: non_default(ClusterFragment {
                default_manager_namespace: (self.cluster.default_manager_namespace
                    != d.cluster.default_manager_namespace)
                    .then(|| self.cluster.default_manager_namespace.clone()),
                mapped_namespaces: (!self.cluster.mapped_namespaces.is_empty())
                    .then(|| self.cluster.mapped_namespaces.clone()),
                unknown: BTreeMap::new(),
            }),
            routing: non_default(RoutingFragment {
                also_proxy: (!self.routing.also_proxy.is_empty())
                    .then(|| self.routing.also_proxy.clone()),
                never_proxy: (!self.routing.never_proxy.is_empty())
                    .then(|| self.routing.never_proxy.clone()),
                allow_conflicting: (!self.routing.allow_conflicting.is_empty())
                    .then(|| self.routing.allow_conflicting.clone()),
                unknown: BTreeMap::new(),
            }),
            dns: non_default(DnsFragment {
                include_suffixes: (!self.dns.include_suffixes.is_empty())
                    .then(|| self.dns.include_suffixes.clone()),
                exclude_suffixes: (!self.dns.exclude_suffixes.is_empty())
                    .then(|| self.dns.exclude_suffixes.clone()),
                local_address: self.dns.local_address.clone(),
                unknown: BTreeMap::new(),
            }),
            unknown: BTreeMap::new(),
        }
    }

    /// Marshal to YAML, omitting keys equal to their defaults.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.to_fragment())
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
