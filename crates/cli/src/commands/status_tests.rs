// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn format_list_joins_or_dashes() {
    assert_eq!(format_list(&[]), "-");
    assert_eq!(
        format_list(&["alpha".to_string(), "beta".to_string()]),
        "alpha, beta"
    );
}

#[test]
fn empty_report_serializes_without_status() {
    let report = StatusReport::default();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["user_daemon_running"], false);
    assert!(json.get("status").is_none());
}
