// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "2.7.0", Some(2) },
    with_v = { "v2.14.2", Some(2) },
    next_major = { "3.0.0", Some(3) },
    garbage = { "latest", None },
)]
fn version_major(version: &str, expected: Option<u64>) {
    let info = VersionInfo {
        name: "traffic-manager".to_string(),
        version: version.to_string(),
    };
    assert_eq!(info.major(), expected);
}

#[test]
fn compatibility_is_major_version_equality() {
    let mut info = VersionInfo {
        name: "traffic-manager".to_string(),
        version: "2.7.0".to_string(),
    };
    assert!(info.compatible());
    info.version = "3.0.0".to_string();
    assert!(!info.compatible());
    info.version = "oops".to_string();
    assert!(!info.compatible());
}

#[test]
fn manager_error_round_trips_intercept_code() {
    let err = ManagerError::from(tp_core::InterceptError::new(
        tp_core::InterceptCode::NotFound,
        "intercept echo not found",
    ));
    let json = serde_json::to_string(&err).unwrap();
    let back: ManagerError = serde_json::from_str(&json).unwrap();
    match back {
        ManagerError::Intercept(ie) => assert_eq!(ie.code, tp_core::InterceptCode::NotFound),
        other => panic!("unexpected: {other:?}"),
    }
}
