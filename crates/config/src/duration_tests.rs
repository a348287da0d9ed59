// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

#[parameterized(
    bare_seconds = { "25", Duration::from_secs(25) },
    suffixed_seconds = { "25s", Duration::from_secs(25) },
    compound = { "2m10s", Duration::from_secs(130) },
    hours = { "1h30m", Duration::from_secs(5400) },
    millis = { "500ms", Duration::from_millis(500) },
    mixed = { "1s500ms", Duration::from_millis(1500) },
    days = { "1d", Duration::from_secs(86400) },
    fractional = { "1.5s", Duration::from_millis(1500) },
)]
fn parse_ok(input: &str, expected: Duration) {
    assert_eq!(parse_duration(input).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    no_number = { "s" },
    bad_suffix = { "10y" },
    garbage = { "abc" },
)]
fn parse_err(input: &str) {
    assert!(parse_duration(input).is_err());
}

#[parameterized(
    seconds = { Duration::from_secs(25), "25s" },
    compound = { Duration::from_secs(130), "2m10s" },
    hours = { Duration::from_secs(5400), "1h30m" },
    millis = { Duration::from_millis(500), "500ms" },
    zero = { Duration::ZERO, "0s" },
)]
fn format_compact(input: Duration, expected: &str) {
    assert_eq!(format_duration(input), expected);
}

#[test]
fn format_parse_round_trip() {
    for d in [
        Duration::from_secs(1),
        Duration::from_secs(130),
        Duration::from_millis(1500),
        Duration::from_secs(86400 + 3600),
    ] {
        assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
    }
}
