// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn run() -> DockerRun {
    DockerRun {
        intercept_name: "echo".to_string(),
        local_port: 8080,
        container_port: Some(9090),
        mount: Some((PathBuf::from("/tmp/tel-echo"), PathBuf::from("/var/run/secrets"))),
        run_args: vec!["busybox".to_string(), "httpd".to_string()],
    }
}

#[test]
fn container_name_embeds_intercept_and_port() {
    assert_eq!(container_name("echo", 8080), "intercept-echo-8080");
}

#[test]
fn run_args_include_env_file_port_and_volume() {
    let args = docker_run_args(&run(), Path::new("/tmp/echo.env")).unwrap();
    let joined = args.join(" ");
    assert!(joined.starts_with("run --rm --name intercept-echo-8080"));
    assert!(joined.contains("--env-file /tmp/echo.env"));
    assert!(joined.contains("-p 127.0.0.1:8080:9090"));
    assert!(joined.contains("-v /tmp/tel-echo:/var/run/secrets"));
    assert!(joined.ends_with("busybox httpd"));
}

#[test]
fn no_mount_no_volume_flag() {
    let mut r = run();
    r.mount = None;
    let args = docker_run_args(&r, Path::new("/tmp/echo.env")).unwrap();
    assert!(!args.contains(&"-v".to_string()));
}

#[parameterized(
    long_flag = { "--detach" },
    short_flag = { "-d" },
    combined = { "-di" },
)]
fn detach_flags_are_rejected(flag: &str) {
    let mut r = run();
    r.run_args.insert(0, flag.to_string());
    let err = docker_run_args(&r, Path::new("/tmp/echo.env")).unwrap_err();
    assert!(matches!(err, DockerError::DetachRejected(_)));
}

#[test]
fn image_name_with_d_is_not_a_detach_flag() {
    let mut r = run();
    r.run_args = vec!["docker.io/datawire/demo".to_string()];
    assert!(docker_run_args(&r, Path::new("/tmp/echo.env")).is_ok());
}

#[test]
fn env_file_is_sorted_key_value_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("echo.env");
    let env = HashMap::from([
        ("B_VAR".to_string(), "two".to_string()),
        ("A_VAR".to_string(), "one".to_string()),
    ]);
    write_env_file(&path, &env).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "A_VAR=one\nB_VAR=two\n");
}
