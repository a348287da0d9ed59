// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Serialize;

#[derive(Serialize)]
struct Sample {
    name: &'static str,
    port: u16,
}

#[test]
fn render_fields_aligns_names() {
    let out = render_fields(&[
        ("Session", "abc".to_string()),
        ("Manager namespace", "ambassador".to_string()),
    ]);
    assert_eq!(
        out,
        "  Session           : abc\n  Manager namespace : ambassador\n"
    );
}

#[test]
fn render_machine_json() {
    let out = render_machine(&Sample { name: "echo", port: 8080 }, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["name"], "echo");
    assert_eq!(value["port"], 8080);
}

#[test]
fn render_machine_yaml() {
    let out = render_machine(&Sample { name: "echo", port: 8080 }, OutputFormat::Yaml).unwrap();
    assert!(out.contains("name: echo"));
    assert!(out.contains("port: 8080"));
}
