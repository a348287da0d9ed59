// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn request(context: &str, namespace: &str) -> ConnectRequest {
    ConnectRequest {
        context: context.to_string(),
        manager_namespace: namespace.to_string(),
        mapped_namespaces: Vec::new(),
    }
}

#[test]
fn requests_match_on_context_and_namespace() {
    assert!(request("prod", "ambassador").matches(&request("prod", "ambassador")));
    assert!(!request("prod", "ambassador").matches(&request("staging", "ambassador")));
    assert!(!request("prod", "ambassador").matches(&request("prod", "other")));
}

#[test]
fn mapped_namespaces_do_not_affect_matching() {
    let mut a = request("prod", "ambassador");
    a.mapped_namespaces = vec!["alpha".into()];
    assert!(a.matches(&request("prod", "ambassador")));
}

#[test]
fn connect_code_error_classification() {
    assert!(!ConnectCode::Unspecified.is_error());
    assert!(!ConnectCode::AlreadyConnected.is_error());
    assert!(ConnectCode::ContextMismatch.is_error());
    assert!(ConnectCode::ClusterUnreachable.is_error());
    assert!(ConnectCode::Unauthenticated.is_error());
}

#[test]
fn connect_code_wire_format() {
    assert_eq!(
        serde_json::to_string(&ConnectCode::AlreadyConnected).unwrap(),
        "\"ALREADY_CONNECTED\""
    );
}
