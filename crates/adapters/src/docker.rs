// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker-driven intercept handlers.
//!
//! Builds the `docker run` invocation for an intercept handler container:
//! collected pod environment via an env file, the local mount point bound
//! into the container, and a deterministic container name so the
//! intercept can stop its handler on leave.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;

use crate::subprocess::{run_with_timeout, DOCKER_TIMEOUT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DockerError {
    #[error("background containers are not supported: remove {0}")]
    DetachRejected(String),

    #[error("failed to write env file {file}: {message}")]
    EnvFile { file: PathBuf, message: String },

    #[error("docker: {0}")]
    Command(String),
}

/// A validated docker-run request for an intercept handler.
#[derive(Debug, Clone)]
pub struct DockerRun {
    pub intercept_name: String,
    pub local_port: u16,
    pub container_port: Option<u16>,
    /// Mount point on the workstation, bound into the container.
    pub mount: Option<(PathBuf, PathBuf)>,
    /// Everything after `--docker-run --`, image included.
    pub run_args: Vec<String>,
}

/// Deterministic handler container name.
pub fn container_name(intercept_name: &str, local_port: u16) -> String {
    format!("intercept-{intercept_name}-{local_port}")
}

/// Validate user args and assemble the full `docker run` argument list.
///
/// `env_file` holds the pod environment collected for the intercept.
pub fn docker_run_args(run: &DockerRun, env_file: &Path) -> Result<Vec<String>, DockerError> {
    for arg in &run.run_args {
        if arg == "-d" || arg == "--detach" {
            return Err(DockerError::DetachRejected(arg.clone()));
        }
        // Catch -d folded into combined short flags, e.g. -di.
        if arg.starts_with('-')
            && !arg.starts_with("--")
            && arg.len() > 1
            && arg[1..].contains('d')
        {
            return Err(DockerError::DetachRejected(arg.clone()));
        }
    }

    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        "--name".to_string(),
        container_name(&run.intercept_name, run.local_port),
        "--env-file".to_string(),
        env_file.display().to_string(),
    ];
    if let Some(container_port) = run.container_port {
        args.push("-p".to_string());
        args.push(format!("127.0.0.1:{}:{container_port}", run.local_port));
    }
    if let Some((local, container)) = &run.mount {
        args.push("-v".to_string());
        args.push(format!("{}:{}", local.display(), container.display()));
    }
    args.extend(run.run_args.iter().cloned());
    Ok(args)
}

/// Write the collected pod environment as a docker env file.
pub fn write_env_file(path: &Path, env: &HashMap<String, String>) -> Result<(), DockerError> {
    let mut keys: Vec<&String> = env.keys().collect();
    keys.sort();
    let mut text = String::new();
    for key in keys {
        text.push_str(key);
        text.push('=');
        text.push_str(&env[key]);
        text.push('\n');
    }
    std::fs::write(path, text).map_err(|e| DockerError::EnvFile {
        file: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Stop a handler container; missing containers are not an error.
pub async fn stop_container(name: &str) -> Result<(), DockerError> {
    let mut cmd = Command::new("docker");
    cmd.args(["stop", name]);
    let output = run_with_timeout(cmd, DOCKER_TIMEOUT, "docker stop")
        .await
        .map_err(DockerError::Command)?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("No such container") {
        return Ok(());
    }
    Err(DockerError::Command(stderr.trim().to_string()))
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
