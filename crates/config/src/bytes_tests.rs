// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "4096", 4096 },
    kibi = { "20Ki", 20 * 1024 },
    mebi = { "20Mi", 20 * 1024 * 1024 },
    gibi = { "1Gi", 1 << 30 },
    kilo = { "4K", 4_000 },
    mega = { "4M", 4_000_000 },
)]
fn parse_ok(input: &str, expected: u64) {
    assert_eq!(ByteSize::parse(input).unwrap(), ByteSize(expected));
}

#[parameterized(
    empty = { "" },
    suffix_only = { "Mi" },
    negative = { "-1Mi" },
    unknown = { "4X" },
)]
fn parse_err(input: &str) {
    assert!(ByteSize::parse(input).is_err());
}

#[test]
fn display_prefers_binary_suffix() {
    assert_eq!(ByteSize(20 * 1024 * 1024).to_string(), "20Mi");
    assert_eq!(ByteSize(1 << 30).to_string(), "1Gi");
    assert_eq!(ByteSize(1234).to_string(), "1234");
}

#[test]
fn yaml_round_trip() {
    let size: ByteSize = serde_yaml::from_str("20Mi").unwrap();
    assert_eq!(size, ByteSize(20 << 20));
    let text = serde_yaml::to_string(&size).unwrap();
    assert_eq!(text.trim(), "20Mi");
    let size: ByteSize = serde_yaml::from_str("1048576").unwrap();
    assert_eq!(size, ByteSize(1 << 20));
}
