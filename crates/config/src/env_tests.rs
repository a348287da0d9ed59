// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn apply_overlays_namespace_and_images() {
    let env = Env {
        manager_namespace: Some("staging".to_string()),
        registry: Some("ghcr.io/example".to_string()),
        agent_image: Some("tel2:2.7".to_string()),
        ..Env::default()
    };
    let mut config = ClientConfig::default();
    env.apply(&mut config);
    assert_eq!(config.cluster.default_manager_namespace, "staging");
    assert_eq!(config.images.registry, "ghcr.io/example");
    assert_eq!(config.images.agent_image, "tel2:2.7");
}

#[test]
fn empty_env_changes_nothing() {
    let mut config = ClientConfig::default();
    Env::default().apply(&mut config);
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn scout_disable_forces_skip_login() {
    let env = Env {
        scout_disable: true,
        ..Env::default()
    };
    let mut config = ClientConfig::default();
    env.apply(&mut config);
    assert!(config.cloud.skip_login);
}

#[test]
fn staging_systema_env_switches_host() {
    let env = Env {
        systema_env: Some("staging".to_string()),
        ..Env::default()
    };
    let mut config = ClientConfig::default();
    env.apply(&mut config);
    assert_eq!(config.cloud.systema_host, "beta-app.datawire.io");
}
