// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    bare = { "8080", 8080, None, None },
    named_svc = { "8080:http", 8080, None, Some(ServicePort::Name("http".into())) },
    numeric_svc = { "8080:9090", 8080, None, Some(ServicePort::Number(9090)) },
    whitespace = { " 8080 ", 8080, None, None },
)]
fn parse_without_docker(
    input: &str,
    local: u16,
    container: Option<u16>,
    service: Option<ServicePort>,
) {
    let spec = PortSpec::parse(input, false).unwrap();
    assert_eq!(spec.local, local);
    assert_eq!(spec.container, container);
    assert_eq!(spec.service, service);
}

#[parameterized(
    local_container = { "8080:9090", 8080, Some(9090), None },
    full = { "8080:9090:http", 8080, Some(9090), Some(ServicePort::Name("http".into())) },
    full_numeric = { "8080:9090:443", 8080, Some(9090), Some(ServicePort::Number(443)) },
)]
fn parse_with_docker(
    input: &str,
    local: u16,
    container: Option<u16>,
    service: Option<ServicePort>,
) {
    let spec = PortSpec::parse(input, true).unwrap();
    assert_eq!(spec.local, local);
    assert_eq!(spec.container, container);
    assert_eq!(spec.service, service);
}

#[test]
fn three_parts_without_docker_is_user_error() {
    let err = PortSpec::parse("8080:9090:http", false).unwrap_err();
    assert!(matches!(err, PortSpecError::ContainerPortWithoutDocker(_)));
}

#[parameterized(
    empty = { "" },
    not_a_number = { "http" },
    too_large = { "70000" },
    negative = { "-1" },
)]
fn bad_local_port(input: &str) {
    assert!(PortSpec::parse(input, false).is_err());
}

#[test]
fn four_parts_rejected() {
    let err = PortSpec::parse("1:2:3:4", true).unwrap_err();
    assert!(matches!(err, PortSpecError::TooManyParts(_)));
}

#[test]
fn docker_container_port_must_be_numeric() {
    assert!(matches!(
        PortSpec::parse("8080:http", true).unwrap_err(),
        PortSpecError::BadPort(_)
    ));
}

#[test]
fn display_round_trips_shape() {
    let spec = PortSpec::parse("8080:9090:http", true).unwrap();
    assert_eq!(spec.to_string(), "8080:9090:http");
    let spec = PortSpec::parse("8080", false).unwrap();
    assert_eq!(spec.to_string(), "8080");
}
