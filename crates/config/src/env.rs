// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable overrides, read once at process start.

use crate::schema::ClientConfig;

/// Recognized environment overrides. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    pub manager_namespace: Option<String>,
    pub registry: Option<String>,
    pub agent_image: Option<String>,
    pub client_image: Option<String>,
    pub user_daemon_address: Option<String>,
    pub scout_disable: bool,
    pub systema_env: Option<String>,
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

impl Env {
    pub fn load() -> Self {
        Self {
            manager_namespace: non_empty("TELEPRESENCE_MANAGER_NAMESPACE"),
            registry: non_empty("TELEPRESENCE_REGISTRY"),
            agent_image: non_empty("TELEPRESENCE_AGENT_IMAGE"),
            client_image: non_empty("TELEPRESENCE_CLIENT_IMAGE"),
            user_daemon_address: non_empty("TELEPRESENCE_USER_DAEMON_ADDRESS"),
            scout_disable: non_empty("SCOUT_DISABLE").is_some_and(|v| v != "0"),
            systema_env: non_empty("SYSTEMA_ENV"),
        }
    }

    /// Overlay these overrides onto a resolved configuration.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(ns) = &self.manager_namespace {
            config.cluster.default_manager_namespace = ns.clone();
        }
        if let Some(registry) = &self.registry {
            config.images.registry = registry.clone();
        }
        if let Some(image) = &self.agent_image {
            config.images.agent_image = image.clone();
        }
        if let Some(image) = &self.client_image {
            config.images.client_image = image.clone();
        }
        if self.scout_disable {
            config.cloud.skip_login = true;
        }
        if let Some(env) = &self.systema_env {
            if env == "staging" {
                config.cloud.systema_host = "beta-app.datawire.io".to_string();
            }
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
