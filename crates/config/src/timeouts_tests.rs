// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

#[test]
fn defaults_cover_every_descriptor() {
    let t = Timeouts::default();
    for id in TimeoutId::ALL {
        assert_eq!(t.get(id), id.default_duration());
    }
    assert_eq!(t.overrides().count(), 0);
}

#[test]
fn error_text_names_key_and_file() {
    let mut t = Timeouts::default();
    t.set(TimeoutId::TrafficManagerApi, Duration::from_secs(1));
    let err = t.error(
        TimeoutId::TrafficManagerApi,
        &PathBuf::from("/home/u/.config/telepresence/config.yml"),
    );
    assert_eq!(
        err.to_string(),
        "the traffic manager gRPC API timed out. The current timeout 1s can be configured \
         as \"timeouts.trafficManagerAPI\" in \"/home/u/.config/telepresence/config.yml\""
    );
}

#[test]
fn compound_duration_in_error_text() {
    let mut t = Timeouts::default();
    t.set(TimeoutId::AgentInstall, Duration::from_secs(130));
    let err = t.error(TimeoutId::AgentInstall, &PathBuf::from("config.yml"));
    assert!(err.to_string().contains("The current timeout 2m10s"));
    assert!(err.to_string().contains("\"timeouts.agentInstall\""));
}

#[tokio::test]
async fn run_returns_value_before_deadline() {
    let t = Timeouts::default();
    let out = t
        .run(TimeoutId::Intercept, &PathBuf::from("config.yml"), async {
            42
        })
        .await
        .unwrap();
    assert_eq!(out, 42);
}

#[tokio::test]
async fn run_yields_typed_error_on_deadline() {
    let mut t = Timeouts::default();
    t.set(TimeoutId::TrafficManagerApi, Duration::from_millis(20));
    let err = t
        .run(
            TimeoutId::TrafficManagerApi,
            &PathBuf::from("config.yml"),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.id, TimeoutId::TrafficManagerApi);
    assert_eq!(err.duration, Duration::from_millis(20));
}

#[test]
fn fragment_resolves_partial_overrides() {
    let yaml = "agentInstall: 2m10s\nclusterConnect: 25s\n";
    let fragment: TimeoutsFragment = serde_yaml::from_str(yaml).unwrap();
    let t = fragment.resolve();
    assert_eq!(t.get(TimeoutId::AgentInstall), Duration::from_secs(130));
    assert_eq!(t.get(TimeoutId::ClusterConnect), Duration::from_secs(25));
    // Unrelated defaults stay intact.
    assert_eq!(
        t.get(TimeoutId::ProxyDial),
        TimeoutId::ProxyDial.default_duration()
    );
}

#[test]
fn fragment_accepts_numeric_scalars() {
    let fragment: TimeoutsFragment = serde_yaml::from_str("apply: 90\nhelm: 1.5\n").unwrap();
    let t = fragment.resolve();
    assert_eq!(t.get(TimeoutId::Apply), Duration::from_secs(90));
    assert_eq!(t.get(TimeoutId::Helm), Duration::from_millis(1500));
}

#[test]
fn from_overrides_round_trips() {
    let mut t = Timeouts::default();
    t.set(TimeoutId::Intercept, Duration::from_secs(5));
    t.set(TimeoutId::FtpShutdown, Duration::from_secs(10));
    let f = TimeoutsFragment::from_overrides(&t);
    assert_eq!(f.resolve(), t);
    assert_eq!(f.intercept, Some(Duration::from_secs(5)));
    assert_eq!(f.agent_install, None);
}

#[test]
fn merge_is_right_biased() {
    let a: TimeoutsFragment = serde_yaml::from_str("apply: 10s\nhelm: 20s\n").unwrap();
    let b: TimeoutsFragment = serde_yaml::from_str("helm: 30s\n").unwrap();
    let merged = a.merge(b);
    assert_eq!(merged.apply, Some(Duration::from_secs(10)));
    assert_eq!(merged.helm, Some(Duration::from_secs(30)));
}
