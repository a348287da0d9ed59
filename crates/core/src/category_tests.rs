// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::intercept::InterceptCode;

#[test]
fn only_unknown_wants_log_hint() {
    assert!(Category::Unknown.wants_log_hint());
    assert!(!Category::User.wants_log_hint());
    assert!(!Category::Config.wants_log_hint());
    assert!(!Category::NoDaemonLogs.wants_log_hint());
}

#[test]
fn failure_round_trips_through_json() {
    let failure = Failure::user("bad flag").with_code(InterceptCode::UnknownFlag);
    let json = serde_json::to_string(&failure).unwrap();
    let back: Failure = serde_json::from_str(&json).unwrap();
    assert_eq!(back, failure);
}

#[test]
fn category_defaults_to_unknown_when_absent() {
    let failure: Failure = serde_json::from_str(r#"{"message":"oops"}"#).unwrap();
    assert_eq!(failure.category, Category::Unknown);
    assert_eq!(failure.code, None);
}

#[test]
fn display_is_the_message_alone() {
    assert_eq!(Failure::user("plain text").to_string(), "plain text");
}
