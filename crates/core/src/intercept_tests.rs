// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    auto = { "true", MountPolicy::Auto },
    disabled = { "false", MountPolicy::Disabled },
    verbatim = { "/mnt/echo", MountPolicy::Path(PathBuf::from("/mnt/echo")) },
)]
fn mount_policy_parse(value: &str, expected: MountPolicy) {
    assert_eq!(MountPolicy::parse(value), expected);
}

#[test]
fn only_waiting_and_active_hold_resources() {
    for d in [
        Disposition::Prepared,
        Disposition::BadArgs,
        Disposition::NoAgent,
        Disposition::Failed,
        Disposition::Removed,
    ] {
        assert!(!d.holds_resources(), "{d} should not hold resources");
    }
    assert!(Disposition::Waiting.holds_resources());
    assert!(Disposition::Active.holds_resources());
}

#[test]
fn disposition_serializes_screaming_snake() {
    let json = serde_json::to_string(&Disposition::BadArgs).unwrap();
    assert_eq!(json, "\"BAD_ARGS\"");
    let back: Disposition = serde_json::from_str("\"NO_AGENT\"").unwrap();
    assert_eq!(back, Disposition::NoAgent);
}

#[test]
fn local_target_in_use_text() {
    let err = InterceptError::local_target_in_use("127.0.0.1", 8080, "echo");
    assert_eq!(
        err.to_string(),
        "Port 127.0.0.1:8080 is already in use by intercept echo"
    );
    assert_eq!(err.code, InterceptCode::LocalTargetInUse);
}

#[test]
fn workload_display() {
    let w = WorkloadRef {
        kind: "Deployment".into(),
        name: "echo-easy".into(),
        namespace: "default".into(),
    };
    assert_eq!(w.to_string(), "Deployment/echo-easy.default");
}
